//! Widmark BAC model.
//!
//! Each drink contributes independently: a short absorption ramp up to its
//! Widmark peak, then linear elimination down to zero. The total at any
//! instant is the sum of all contributions, so the model works on unsorted,
//! arbitrarily spaced events.
//!
//! Time is measured in hours relative to "now": negative `t` is the past,
//! positive `t` is a projection. An event consumed `hours_ago` hours ago
//! starts contributing at `t = -hours_ago`.

use crate::catalog::STANDARD_DRINK_GRAMS;
use crate::config::ModelConfig;
use crate::{Profile, SessionEvent};
use serde::{Deserialize, Serialize};

/// Body mass per pound, in grams
pub const GRAMS_PER_POUND: f64 = 454.0;

/// One sample of the BAC curve
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurvePoint {
    pub t: f64,
    pub bac: f64,
}

/// BAC sampled over the model window at a fixed step
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Curve {
    pub step_minutes: u32,
    pub points: Vec<CurvePoint>,
}

impl Curve {
    /// Samples at `t >= 0`
    pub fn forward(&self) -> &[CurvePoint] {
        let start = self.points.partition_point(|p| p.t < 0.0);
        &self.points[start..]
    }

    /// Highest sample over the whole window
    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.bac).fold(0.0, f64::max)
    }

    /// Highest sample from now on
    pub fn forward_peak(&self) -> f64 {
        self.forward().iter().map(|p| p.bac).fold(0.0, f64::max)
    }

    /// Last sampled instant
    pub fn window_end(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.t)
    }

    /// First `t >= 0` from which `settled` holds at that and every later sample.
    ///
    /// Returns `None` when the last sample still fails `settled`.
    pub fn settles_at(&self, settled: impl Fn(f64) -> bool) -> Option<f64> {
        let forward = self.forward();
        match forward.iter().rposition(|p| !settled(p.bac)) {
            None => Some(forward.first().map_or(0.0, |p| p.t)),
            Some(i) => forward.get(i + 1).map(|p| p.t),
        }
    }

    /// Minutes of the window spent with `pred` true, at sample resolution
    pub fn minutes_where(&self, pred: impl Fn(f64) -> bool) -> u32 {
        let samples = self.points.iter().filter(|p| pred(p.bac)).count() as u32;
        samples * self.step_minutes
    }

    /// Curve value at the sample nearest to `t`, if `t` lies inside the window
    pub fn sample_near(&self, t: f64) -> Option<CurvePoint> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if t < first.t || t > last.t {
            return None;
        }
        let step_hours = f64::from(self.step_minutes) / 60.0;
        let index = ((t - first.t) / step_hours).round() as usize;
        self.points.get(index.min(self.points.len() - 1)).copied()
    }
}

/// The BAC model with its constants fixed at construction
#[derive(Clone, Debug, Default)]
pub struct BacModel {
    config: ModelConfig,
}

impl BacModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Widmark distribution factor for the profile's sex
    pub fn widmark_r(&self, profile: &Profile) -> f64 {
        if profile.is_male {
            self.config.widmark_r_male
        } else {
            self.config.widmark_r_female
        }
    }

    /// Fully-absorbed BAC rise (%) from `standard_drinks`
    pub fn peak_contribution(&self, profile: &Profile, standard_drinks: f64) -> f64 {
        let grams = standard_drinks * STANDARD_DRINK_GRAMS;
        let body_grams = profile.weight_lb * GRAMS_PER_POUND;
        grams / (body_grams * self.widmark_r(profile)) * 100.0
    }

    /// One event's share of BAC at time `t`
    pub fn event_contribution(&self, profile: &Profile, event: &SessionEvent, t: f64) -> f64 {
        let elapsed = t + event.hours_ago;
        if elapsed < 0.0 {
            return 0.0;
        }

        let peak = self.peak_contribution(profile, event.standard_drinks);
        let absorption = self.config.absorption_hours;
        if elapsed < absorption {
            let onset = self.config.absorption_onset_fraction;
            return peak * (onset + (1.0 - onset) * elapsed / absorption);
        }

        (peak - self.config.elimination_per_hour * (elapsed - absorption)).max(0.0)
    }

    /// Total BAC at time `t`
    pub fn bac_at(&self, profile: &Profile, events: &[SessionEvent], t: f64) -> f64 {
        self.sum_at(profile, &canonical_order(events), t)
    }

    /// BAC at `t = 0`
    pub fn bac_now(&self, profile: &Profile, events: &[SessionEvent]) -> f64 {
        self.bac_at(profile, events, 0.0)
    }

    /// Sample the full window.
    ///
    /// Sample instants are integer minute offsets, so `t = 0` is always sampled.
    pub fn curve(&self, profile: &Profile, events: &[SessionEvent]) -> Curve {
        self.sample(profile, events, -i64::from(self.config.lookback_minutes))
    }

    /// Sample from the first drink (or the usual look-back, if earlier)
    /// through the look-ahead, so the whole session is on the curve.
    pub fn session_curve(&self, profile: &Profile, events: &[SessionEvent]) -> Curve {
        let step = i64::from(self.config.step_minutes.max(1));
        let first_drink = events.iter().map(|e| e.hours_ago).fold(0.0, f64::max);
        let first_minute = (first_drink * 60.0).ceil() as i64;
        // Round out to a whole step so t = 0 stays on the grid
        let session_start = -((first_minute + step - 1) / step) * step;
        let start = session_start.min(-i64::from(self.config.lookback_minutes));
        self.sample(profile, events, start)
    }

    fn sample(&self, profile: &Profile, events: &[SessionEvent], start: i64) -> Curve {
        let ordered = canonical_order(events);
        let step = self.config.step_minutes.max(1) as usize;
        let end = i64::from(self.config.lookahead_minutes);

        let points = (start..=end)
            .step_by(step)
            .map(|minute| {
                let t = minute as f64 / 60.0;
                CurvePoint {
                    t,
                    bac: self.sum_at(profile, &ordered, t),
                }
            })
            .collect();

        Curve {
            step_minutes: self.config.step_minutes,
            points,
        }
    }

    /// Hours until the curve reaches zero for good; saturates at the window end
    pub fn hours_until_sober(&self, curve: &Curve) -> f64 {
        curve
            .settles_at(|bac| bac <= 0.0)
            .unwrap_or_else(|| curve.window_end())
    }

    fn sum_at(&self, profile: &Profile, ordered: &[SessionEvent], t: f64) -> f64 {
        ordered
            .iter()
            .map(|event| self.event_contribution(profile, event, t))
            .sum::<f64>()
            .max(0.0)
    }
}

/// Events in a fixed order so floating-point sums do not depend on list order
fn canonical_order(events: &[SessionEvent]) -> Vec<SessionEvent> {
    let mut ordered = events.to_vec();
    ordered.sort_by(|a, b| {
        a.hours_ago
            .total_cmp(&b.hours_ago)
            .then_with(|| a.standard_drinks.total_cmp(&b.standard_drinks))
    });
    ordered
}
