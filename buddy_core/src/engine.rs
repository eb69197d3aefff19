//! Session engine: validation and orchestration of every query.
//!
//! A query validates its inputs, samples the curve once and derives every
//! metric from that same curve, so drive advice, hangover plan and insights
//! can never disagree about the state they describe. Nothing here mutates
//! the caller's data; repeating a query yields identical results.

use crate::advisory::{
    self, ChartInsights, DriveAdvice, HangoverPlan, Hydration, PacePrediction, SafetyAlert,
};
use crate::config::{AdvisoryConfig, Config};
use crate::debrief::{self, DebriefSummary};
use crate::model::{BacModel, Curve};
use crate::planning::{self, TargetProjection};
use crate::store::SessionEventStore;
use crate::{Error, IndexedEvent, Profile, Result, SessionEvent, Totals};
use serde::{Deserialize, Serialize};

/// Caller-owned inputs to a state query
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionQuery {
    /// Water consumed this session, in ounces
    #[serde(default)]
    pub water_oz: f64,

    /// Optional planner target; also the hangover horizon when set
    #[serde(default)]
    pub hours_until_target: Option<f64>,
}

/// Everything a caller needs to render the current session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub profile: Profile,
    pub bac_now: f64,
    pub curve: Curve,
    pub hours_until_sober_from_now: f64,
    pub drink_count: usize,
    pub total_standard_drinks: f64,
    pub total_calories: f64,
    pub total_carbs_g: f64,
    pub total_sugar_g: f64,
    pub session_events: Vec<IndexedEvent>,
    pub drive_advice: DriveAdvice,
    pub hangover_plan: HangoverPlan,
    pub pace_prediction: PacePrediction,
    pub hydration: Hydration,
    pub insights: ChartInsights,
    pub safety_alert: Option<SafetyAlert>,
    pub target_projection: Option<TargetProjection>,
}

/// Model plus advisory policy, fixed for the lifetime of the engine
#[derive(Clone, Debug, Default)]
pub struct SessionEngine {
    model: BacModel,
    policy: AdvisoryConfig,
}

impl SessionEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            model: BacModel::new(config.model.clone()),
            policy: config.advisory.clone(),
        }
    }

    pub fn model(&self) -> &BacModel {
        &self.model
    }

    pub fn policy(&self) -> &AdvisoryConfig {
        &self.policy
    }

    /// Full state of the active session
    pub fn state(
        &self,
        profile: &Profile,
        store: &SessionEventStore,
        query: &SessionQuery,
    ) -> Result<SessionState> {
        let events = store.events();
        validate_inputs(profile, events)?;
        if !(query.water_oz.is_finite() && query.water_oz >= 0.0) {
            return Err(Error::invalid(format!(
                "water_oz must be a non-negative number, got {}",
                query.water_oz
            )));
        }
        if let Some(target) = query.hours_until_target {
            planning::validate_target(target)?;
        }

        let policy = &self.policy;
        let curve = self.model.curve(profile, events);
        let bac_now = self.model.bac_now(profile, events);
        let hours_until_sober_from_now = self.model.hours_until_sober(&curve);
        let Totals {
            drink_count,
            standard_drinks,
            calories,
            carbs_g,
            sugar_g,
        } = store.totals();

        let target_hours = query
            .hours_until_target
            .unwrap_or(policy.default_target_hours);
        let target_projection = query
            .hours_until_target
            .map(|target| {
                planning::project_to_target(
                    &self.model,
                    profile,
                    events,
                    target,
                    policy.legal_limit_bac,
                )
            })
            .transpose()?;

        tracing::debug!(
            "State query: {} events, bac_now {:.4}, sober in {}h",
            drink_count,
            bac_now,
            hours_until_sober_from_now
        );

        Ok(SessionState {
            profile: *profile,
            bac_now,
            hours_until_sober_from_now,
            drink_count,
            total_standard_drinks: standard_drinks,
            total_calories: calories,
            total_carbs_g: carbs_g,
            total_sugar_g: sugar_g,
            session_events: store.indexed(),
            drive_advice: advisory::drive_advice(bac_now, policy),
            hangover_plan: advisory::hangover_plan(&curve, standard_drinks, target_hours, policy),
            pace_prediction: advisory::pace_prediction(&self.model, profile, events, policy),
            hydration: advisory::hydration(
                query.water_oz,
                drink_count,
                bac_now,
                hours_until_sober_from_now,
                policy,
            ),
            insights: advisory::chart_insights(&curve, bac_now, events, policy),
            safety_alert: advisory::safety_alert(bac_now, policy),
            target_projection,
            curve,
        })
    }

    /// Projected BAC `hours_until_target` hours from now
    pub fn plan(
        &self,
        profile: &Profile,
        events: &[SessionEvent],
        hours_until_target: f64,
    ) -> Result<TargetProjection> {
        validate_inputs(profile, events)?;
        planning::project_to_target(
            &self.model,
            profile,
            events,
            hours_until_target,
            self.policy.legal_limit_bac,
        )
    }

    /// Summary of a finished or saved session
    pub fn debrief(&self, profile: &Profile, events: &[SessionEvent]) -> Result<DebriefSummary> {
        validate_inputs(profile, events)?;
        let curve = self.model.session_curve(profile, events);
        Ok(debrief::summarize(
            &self.model,
            &curve,
            events.len(),
            &self.policy,
        ))
    }
}

fn validate_inputs(profile: &Profile, events: &[SessionEvent]) -> Result<()> {
    profile.validate()?;
    for (index, event) in events.iter().enumerate() {
        event
            .validate()
            .map_err(|e| Error::invalid(format!("event {}: {}", index, e)))?;
    }
    Ok(())
}
