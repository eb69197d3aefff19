//! Time-to-target planner.

use crate::model::BacModel;
use crate::{Error, Profile, Result, SessionEvent};
use serde::{Deserialize, Serialize};

/// Projected BAC at a future instant, assuming no further drinks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TargetProjection {
    pub hours_until_target: f64,
    pub projected_bac: f64,
    pub below_legal_limit: bool,
    pub sober: bool,
}

/// Reject targets that are not strictly in the future
pub fn validate_target(hours_until_target: f64) -> Result<()> {
    if !(hours_until_target.is_finite() && hours_until_target > 0.0) {
        return Err(Error::invalid(format!(
            "hours_until_target must be a positive number, got {}",
            hours_until_target
        )));
    }
    Ok(())
}

/// Evaluate the model directly at the target, so targets past the sampled
/// window are still exact.
pub fn project_to_target(
    model: &BacModel,
    profile: &Profile,
    events: &[SessionEvent],
    hours_until_target: f64,
    legal_limit_bac: f64,
) -> Result<TargetProjection> {
    validate_target(hours_until_target)?;

    let projected_bac = model.bac_at(profile, events, hours_until_target);
    tracing::debug!(
        "Projected BAC {:.4} at +{}h",
        projected_bac,
        hours_until_target
    );

    Ok(TargetProjection {
        hours_until_target,
        projected_bac,
        below_legal_limit: projected_bac < legal_limit_bac,
        sober: projected_bac <= 0.0,
    })
}
