//! Safety guidance derived from the BAC curve.
//!
//! Everything here is a pure function of the curve, the current totals and
//! the advisory thresholds in [`AdvisoryConfig`]. Tier strings are fixed
//! policy text; callers render them as-is.

use crate::config::AdvisoryConfig;
use crate::model::{BacModel, Curve, CurvePoint};
use crate::{Profile, SessionEvent};
use serde::{Deserialize, Serialize};

/// Pace coach: take a long break at or above this BAC
const PACE_BREAK_BAC: f64 = 0.06;

/// Pace coach: wait and hydrate at or above this BAC
const PACE_WAIT_BAC: f64 = 0.04;

/// Pace coach: drink count or sober horizon that calls for one-per-hour spacing
const PACE_SPACING_DRINKS: usize = 4;
const PACE_SPACING_SOBER_HOURS: f64 = 4.0;

/// Lower edge of the "low" risk zone
const LOW_ZONE_BAC: f64 = 0.02;

/// Alert levels above the legal limit
const HIGH_RISK_BAC: f64 = 0.12;
const CRITICAL_BAC: f64 = 0.16;

/// Look-back used for the drinks-per-hour pace metric
const PACE_WINDOW_HOURS: f64 = 3.0;

// ============================================================================
// Drive advice
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriveStatus {
    DoNotDrive,
    Caution,
    LowerRisk,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DriveAdvice {
    pub status: DriveStatus,
    pub title: String,
    pub message: String,
    pub action: String,
    pub legal_limit_bac: f64,
}

/// Three-tier drive advice keyed off current BAC
pub fn drive_advice(bac_now: f64, policy: &AdvisoryConfig) -> DriveAdvice {
    let (status, title, message, action) = if bac_now >= policy.legal_limit_bac {
        (
            DriveStatus::DoNotDrive,
            "Above legal limit",
            "Estimated BAC is at or above the legal limit. Do not drive.",
            "Use a rideshare, taxi, or sober driver now.",
        )
    } else if bac_now >= policy.caution_bac {
        (
            DriveStatus::Caution,
            "Likely impaired",
            "Estimated BAC is below the legal limit but in a high-risk impairment range.",
            "Do not drive. Wait and use a non-driving option.",
        )
    } else {
        (
            DriveStatus::LowerRisk,
            "Lower risk",
            "Estimated BAC is below the caution range. This is an estimate, not a guarantee.",
            "If any alcohol is still present, the safest choice is not to drive.",
        )
    };

    DriveAdvice {
        status,
        title: title.into(),
        message: message.into(),
        action: action.into(),
        legal_limit_bac: policy.legal_limit_bac,
    }
}

// ============================================================================
// Hangover plan
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HangoverRisk {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HangoverPlan {
    pub hangover_risk: HangoverRisk,
    /// Latest last-drink time that still clears `recovery_hours` before the
    /// target, in hours from now; negative means already past
    pub stop_by_hours_from_now: f64,
    pub hours_until_target: f64,
    /// When BAC settles below the clear level with no further drinks
    pub hours_until_clear: f64,
    pub peak_bac: f64,
    pub message: String,
}

/// Classify hangover risk for a target `hours_until_target` hours from now.
///
/// Assumes no further drinks: the clear time comes from the current curve,
/// and every hour still needed to clear moves the stop-by time earlier.
pub fn hangover_plan(
    curve: &Curve,
    total_standard_drinks: f64,
    hours_until_target: f64,
    policy: &AdvisoryConfig,
) -> HangoverPlan {
    let peak_bac = curve.forward_peak();
    let hours_until_clear = curve
        .settles_at(|bac| bac < policy.hangover_clear_bac)
        .unwrap_or_else(|| curve.window_end());
    // Timing only matters while there is alcohol left to clear
    let clearing = total_standard_drinks > 0.0 && hours_until_clear > 0.0;
    let slack = hours_until_target - hours_until_clear;

    let hangover_risk = if peak_bac >= policy.hangover_high_peak_bac
        || total_standard_drinks >= policy.hangover_high_drinks
        || (clearing && slack < 0.0)
    {
        HangoverRisk::High
    } else if peak_bac >= policy.hangover_medium_peak_bac
        || total_standard_drinks >= policy.hangover_medium_drinks
        || (clearing && slack < policy.recovery_hours)
    {
        HangoverRisk::Medium
    } else {
        HangoverRisk::Low
    };

    let message = match hangover_risk {
        HangoverRisk::Low => "You're on track. Stay hydrated and get some sleep.",
        HangoverRisk::Medium => {
            "You might feel a bit off. Consider stopping soon and drinking water."
        }
        HangoverRisk::High => {
            "High chance of a rough morning. Stop drinking now, have water, and get rest."
        }
    };

    HangoverPlan {
        hangover_risk,
        stop_by_hours_from_now: round_to_tenth(slack - policy.recovery_hours),
        hours_until_target,
        hours_until_clear,
        peak_bac,
        message: message.into(),
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Pace prediction
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PacePrediction {
    pub lookahead_hours: f64,
    pub bac_in_30m_if_one_more_now: f64,
    pub bac_in_30m_as_is: f64,
    pub delta: f64,
    pub recommendation: String,
}

/// Project the effect of one more standard drink right now.
///
/// Works on a copy of `events`; the caller's list is never touched.
pub fn pace_prediction(
    model: &BacModel,
    profile: &Profile,
    events: &[SessionEvent],
    policy: &AdvisoryConfig,
) -> PacePrediction {
    let t = policy.pace_lookahead_hours;
    let as_is = model.bac_at(profile, events, t);

    let mut with_one_more = events.to_vec();
    with_one_more.push(SessionEvent::new(0.0, 1.0));
    let if_one_more = model.bac_at(profile, &with_one_more, t);

    let recommendation = if if_one_more >= policy.legal_limit_bac {
        "One more now would likely put you at or above the legal limit. Switch to water."
    } else if if_one_more >= policy.caution_bac {
        "One more now keeps you under the legal limit but in the impairment range. Wait and hydrate first."
    } else {
        "One more now is projected to stay in the lower range. Pace it and alternate with water."
    };

    PacePrediction {
        lookahead_hours: t,
        bac_in_30m_if_one_more_now: if_one_more,
        bac_in_30m_as_is: as_is,
        delta: if_one_more - as_is,
        recommendation: recommendation.into(),
    }
}

// ============================================================================
// Hydration
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Hydration {
    pub water_oz: f64,
    pub target_oz: f64,
    pub remaining_oz: f64,
    pub message: String,
    pub pacing_message: String,
}

/// Water target for the session plus the pace coach line
pub fn hydration(
    water_oz: f64,
    drink_count: usize,
    bac_now: f64,
    hours_until_sober: f64,
    policy: &AdvisoryConfig,
) -> Hydration {
    let target_oz = policy
        .hydration_min_oz
        .max(drink_count as f64 * policy.hydration_oz_per_drink);
    let remaining_oz = (target_oz - water_oz).max(0.0);

    let message = if remaining_oz > 0.0 {
        format!("{} oz to match a 1:1 drink-to-water pace.", remaining_oz)
    } else {
        "Hydration target met.".to_string()
    };

    let pacing_message = if bac_now >= policy.legal_limit_bac {
        "Pause now. Water only and plan a ride."
    } else if bac_now >= PACE_BREAK_BAC {
        "Take a 60+ min break before another drink."
    } else if bac_now >= PACE_WAIT_BAC {
        "Wait at least 45 min and drink water first."
    } else if drink_count >= PACE_SPACING_DRINKS || hours_until_sober >= PACE_SPACING_SOBER_HOURS
    {
        "Keep spacing drinks to about 1 per hour."
    } else if drink_count > 0 {
        "Pace looks moderate. Keep alternating with water."
    } else {
        "Log drinks to get pacing advice."
    };

    Hydration {
        water_oz,
        target_oz,
        remaining_oz,
        message,
        pacing_message: pacing_message.into(),
    }
}

// ============================================================================
// Chart insights and alerts
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskZone {
    Minimal,
    Low,
    Elevated,
    High,
}

pub fn risk_zone(bac: f64, policy: &AdvisoryConfig) -> RiskZone {
    if bac >= policy.legal_limit_bac {
        RiskZone::High
    } else if bac >= policy.caution_bac {
        RiskZone::Elevated
    } else if bac >= LOW_ZONE_BAC {
        RiskZone::Low
    } else {
        RiskZone::Minimal
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartInsights {
    pub peak_bac: f64,
    /// Only set while currently at or above the legal limit
    pub below_legal_in_hours: Option<f64>,
    pub risk_zone: RiskZone,
    pub pace_drinks_per_hour: f64,
    pub event_markers: Vec<CurvePoint>,
}

pub fn chart_insights(
    curve: &Curve,
    bac_now: f64,
    events: &[SessionEvent],
    policy: &AdvisoryConfig,
) -> ChartInsights {
    let legal = policy.legal_limit_bac;
    let below_legal_in_hours = (bac_now >= legal).then(|| {
        curve
            .settles_at(|bac| bac < legal)
            .unwrap_or_else(|| curve.window_end())
    });

    let recent: f64 = events
        .iter()
        .filter(|e| e.hours_ago <= PACE_WINDOW_HOURS)
        .map(|e| e.standard_drinks)
        .sum();

    ChartInsights {
        peak_bac: curve.peak(),
        below_legal_in_hours,
        risk_zone: risk_zone(bac_now, policy),
        pace_drinks_per_hour: recent / PACE_WINDOW_HOURS,
        event_markers: events
            .iter()
            .filter_map(|e| curve.sample_near(-e.hours_ago))
            .collect(),
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    OverLimit,
    HighRisk,
    Critical,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SafetyAlert {
    pub level: AlertLevel,
    pub message: String,
}

/// Alert classification for BAC at or above the legal limit
pub fn safety_alert(bac_now: f64, policy: &AdvisoryConfig) -> Option<SafetyAlert> {
    let (level, message) = if bac_now >= CRITICAL_BAC {
        (
            AlertLevel::Critical,
            "Critical BAC risk. Call emergency services now if symptoms worsen (vomiting, confusion, unresponsiveness).",
        )
    } else if bac_now >= HIGH_RISK_BAC {
        (
            AlertLevel::HighRisk,
            "High-risk BAC detected. Stay with trusted people, stop drinking, and consider emergency support now.",
        )
    } else if bac_now >= policy.legal_limit_bac {
        (
            AlertLevel::OverLimit,
            "BAC is above the legal limit. Do not drive. Hydrate and arrange a safe ride.",
        )
    } else {
        return None;
    };

    Some(SafetyAlert {
        level,
        message: message.into(),
    })
}
