//! Core domain types for the Drinking Buddy engine.
//!
//! This module defines the inputs the engine works on:
//! - The body profile used by the Widmark model
//! - Drink catalog entries
//! - Session events and their nutrient payload

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

// ============================================================================
// Profile
// ============================================================================

/// Body profile used to size the volume of distribution
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub weight_lb: f64,
    pub is_male: bool,
}

impl Profile {
    /// Build a validated profile
    pub fn new(weight_lb: f64, is_male: bool) -> Result<Self> {
        let profile = Self { weight_lb, is_male };
        profile.validate()?;
        Ok(profile)
    }

    /// Reject weights the model cannot divide by
    pub fn validate(&self) -> Result<()> {
        if !self.weight_lb.is_finite() || self.weight_lb <= 0.0 {
            return Err(Error::invalid(format!(
                "weight_lb must be a positive number, got {}",
                self.weight_lb
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Nutrients copied onto an event when it is recorded
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Nutrients {
    pub calories: f64,
    pub carbs_g: f64,
    pub sugar_g: f64,
}

impl Nutrients {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("calories", self.calories),
            ("carbs_g", self.carbs_g),
            ("sugar_g", self.sugar_g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            carbs_g: self.carbs_g * factor,
            sugar_g: self.sugar_g * factor,
        }
    }
}

/// One logged drink, positioned relative to "now"
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionEvent {
    pub hours_ago: f64,
    pub standard_drinks: f64,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

impl SessionEvent {
    /// An event carrying only alcohol, no nutrient data
    pub fn new(hours_ago: f64, standard_drinks: f64) -> Self {
        Self {
            hours_ago,
            standard_drinks,
            nutrients: Nutrients::default(),
        }
    }

    /// Resolve `count` servings of a catalog entry into an event.
    ///
    /// Quantities are copied so later catalog changes never affect a logged drink.
    pub fn from_catalog(entry: &CatalogEntry, count: f64, hours_ago: f64) -> Result<Self> {
        if !count.is_finite() || count <= 0.0 {
            return Err(Error::invalid(format!(
                "count must be a positive number, got {}",
                count
            )));
        }
        let event = Self {
            hours_ago,
            standard_drinks: entry.standard_drinks * count,
            nutrients: entry.nutrients.scaled(count),
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.hours_ago.is_finite() || self.hours_ago < 0.0 {
            return Err(Error::invalid(format!(
                "hours_ago must be a non-negative number, got {}",
                self.hours_ago
            )));
        }
        if !self.standard_drinks.is_finite() || self.standard_drinks <= 0.0 {
            return Err(Error::invalid(format!(
                "standard_drinks must be a positive number, got {}",
                self.standard_drinks
            )));
        }
        self.nutrients.validate()
    }
}

/// Positional view of an event, as handed to callers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct IndexedEvent {
    pub index: usize,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// Running totals over the event list
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub drink_count: usize,
    pub standard_drinks: f64,
    pub calories: f64,
    pub carbs_g: f64,
    pub sugar_g: f64,
}

impl Totals {
    pub fn of(events: &[SessionEvent]) -> Self {
        events.iter().fold(Self::default(), |mut acc, e| {
            acc.drink_count += 1;
            acc.standard_drinks += e.standard_drinks;
            acc.calories += e.nutrients.calories;
            acc.carbs_g += e.nutrients.carbs_g;
            acc.sugar_g += e.nutrients.sugar_g;
            acc
        })
    }
}

/// Allowed "sipped over" durations, in minutes
pub const SIP_MINUTES_ALLOWED: [u32; 6] = [0, 15, 30, 45, 60, 90];

/// Shift a drink sipped over `sip_minutes` to the midpoint of the sip.
///
/// `hours_ago` is when the sip finished; the event lands halfway back.
pub fn sip_midpoint_hours_ago(hours_ago: f64, sip_minutes: u32) -> Result<f64> {
    if !SIP_MINUTES_ALLOWED.contains(&sip_minutes) {
        return Err(Error::invalid(format!(
            "sip_minutes must be one of {:?}, got {}",
            SIP_MINUTES_ALLOWED, sip_minutes
        )));
    }
    Ok(hours_ago + f64::from(sip_minutes) / 120.0)
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Grouping used by the catalog listing
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DrinkCategory {
    Generic,
    Beer,
    Seltzer,
    Wine,
    Liquor,
    Cocktail,
}

impl std::str::FromStr for DrinkCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "beer" => Ok(Self::Beer),
            "seltzer" => Ok(Self::Seltzer),
            "wine" => Ok(Self::Wine),
            "liquor" => Ok(Self::Liquor),
            "cocktail" => Ok(Self::Cocktail),
            other => Err(Error::invalid(format!("unknown drink category '{}'", other))),
        }
    }
}

/// A catalog drink with its per-serving alcohol and nutrient content
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category: DrinkCategory,
    pub abv: f64,
    pub serving_oz: f64,
    pub standard_drinks: f64,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    pub brand: Option<String>,
}

/// The drink catalog, keyed by id
#[derive(Clone, Debug)]
pub struct Catalog {
    pub entries: BTreeMap<String, CatalogEntry>,
}
