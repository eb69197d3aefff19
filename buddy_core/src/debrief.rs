//! After-session summary.

use crate::config::AdvisoryConfig;
use crate::model::{BacModel, Curve};
use serde::{Deserialize, Serialize};

/// Drink count that triggers the hydration suggestion
const HYDRATION_SUGGESTION_DRINKS: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DebriefSummary {
    pub peak_bac: f64,
    pub minutes_over_legal_limit: u32,
    pub drink_count: usize,
    pub hours_until_sober_now: f64,
    pub suggestions: Vec<String>,
}

/// Summarize a session from its full curve
pub fn summarize(
    model: &BacModel,
    curve: &Curve,
    drink_count: usize,
    policy: &AdvisoryConfig,
) -> DebriefSummary {
    let peak_bac = curve.peak();
    let minutes_over_legal_limit = curve.minutes_where(|bac| bac >= policy.legal_limit_bac);
    let hours_until_sober_now = model.hours_until_sober(curve);

    let mut suggestions = Vec::new();
    if minutes_over_legal_limit > 0 {
        suggestions.push(format!(
            "You spent about {} minutes over the legal limit. Space drinks further apart next time.",
            minutes_over_legal_limit
        ));
    }
    if peak_bac >= policy.hangover_high_peak_bac {
        suggestions.push(
            "Your peak was in the high-risk range. Set a drink cap before you start.".to_string(),
        );
    }
    if drink_count >= HYDRATION_SUGGESTION_DRINKS {
        suggestions.push("Alternate each drink with a glass of water.".to_string());
    }
    if hours_until_sober_now > 0.0 {
        suggestions.push(format!(
            "Alcohol is still in your system for about {:.1} more hours. Plan a ride.",
            hours_until_sober_now
        ));
    }
    if suggestions.is_empty() {
        suggestions.push("Nice pacing. Keep alternating with water.".to_string());
    }

    DebriefSummary {
        peak_bac,
        minutes_over_legal_limit,
        drink_count,
        hours_until_sober_now,
        suggestions,
    }
}
