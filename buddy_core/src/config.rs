//! Configuration file support for Drinking Buddy.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/buddy/config.toml`. Every
//! model constant and advisory threshold has a documented default; a config
//! file only needs the values it overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub advisory: AdvisoryConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Widmark model constants and curve sampling window
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Body-water distribution factor for men
    #[serde(default = "default_widmark_r_male")]
    pub widmark_r_male: f64,

    /// Body-water distribution factor for women
    #[serde(default = "default_widmark_r_female")]
    pub widmark_r_female: f64,

    /// Linear elimination, %BAC per hour
    #[serde(default = "default_elimination_per_hour")]
    pub elimination_per_hour: f64,

    /// Length of the absorption ramp after each drink
    #[serde(default = "default_absorption_hours")]
    pub absorption_hours: f64,

    /// Share of a drink's peak contribution present at the moment it is consumed
    #[serde(default = "default_absorption_onset_fraction")]
    pub absorption_onset_fraction: f64,

    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u32,

    #[serde(default = "default_lookahead_minutes")]
    pub lookahead_minutes: u32,

    #[serde(default = "default_step_minutes")]
    pub step_minutes: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            widmark_r_male: default_widmark_r_male(),
            widmark_r_female: default_widmark_r_female(),
            elimination_per_hour: default_elimination_per_hour(),
            absorption_hours: default_absorption_hours(),
            absorption_onset_fraction: default_absorption_onset_fraction(),
            lookback_minutes: default_lookback_minutes(),
            lookahead_minutes: default_lookahead_minutes(),
            step_minutes: default_step_minutes(),
        }
    }
}

/// Thresholds behind drive advice, hangover risk, pacing and hydration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryConfig {
    #[serde(default = "default_legal_limit_bac")]
    pub legal_limit_bac: f64,

    #[serde(default = "default_caution_bac")]
    pub caution_bac: f64,

    #[serde(default = "default_hangover_high_peak_bac")]
    pub hangover_high_peak_bac: f64,

    #[serde(default = "default_hangover_high_drinks")]
    pub hangover_high_drinks: f64,

    #[serde(default = "default_hangover_medium_peak_bac")]
    pub hangover_medium_peak_bac: f64,

    #[serde(default = "default_hangover_medium_drinks")]
    pub hangover_medium_drinks: f64,

    /// BAC treated as "cleared" when planning around a target time
    #[serde(default = "default_hangover_clear_bac")]
    pub hangover_clear_bac: f64,

    /// Hours to leave between the last drink and the target
    #[serde(default = "default_recovery_hours")]
    pub recovery_hours: f64,

    /// Target used when the caller does not supply one
    #[serde(default = "default_target_hours")]
    pub default_target_hours: f64,

    #[serde(default = "default_pace_lookahead_hours")]
    pub pace_lookahead_hours: f64,

    #[serde(default = "default_hydration_oz_per_drink")]
    pub hydration_oz_per_drink: f64,

    #[serde(default = "default_hydration_min_oz")]
    pub hydration_min_oz: f64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            legal_limit_bac: default_legal_limit_bac(),
            caution_bac: default_caution_bac(),
            hangover_high_peak_bac: default_hangover_high_peak_bac(),
            hangover_high_drinks: default_hangover_high_drinks(),
            hangover_medium_peak_bac: default_hangover_medium_peak_bac(),
            hangover_medium_drinks: default_hangover_medium_drinks(),
            hangover_clear_bac: default_hangover_clear_bac(),
            recovery_hours: default_recovery_hours(),
            default_target_hours: default_target_hours(),
            pace_lookahead_hours: default_pace_lookahead_hours(),
            hydration_oz_per_drink: default_hydration_oz_per_drink(),
            hydration_min_oz: default_hydration_min_oz(),
        }
    }
}

/// Caller-side session policy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// How long a deleted event can be undone
    #[serde(default = "default_recall_window_seconds")]
    pub recall_window_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recall_window_seconds: default_recall_window_seconds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("buddy")
}

fn default_widmark_r_male() -> f64 {
    0.68
}

fn default_widmark_r_female() -> f64 {
    0.55
}

fn default_elimination_per_hour() -> f64 {
    0.015
}

fn default_absorption_hours() -> f64 {
    0.5
}

fn default_absorption_onset_fraction() -> f64 {
    0.9
}

fn default_lookback_minutes() -> u32 {
    6 * 60
}

fn default_lookahead_minutes() -> u32 {
    24 * 60
}

fn default_step_minutes() -> u32 {
    5
}

fn default_legal_limit_bac() -> f64 {
    0.08
}

fn default_caution_bac() -> f64 {
    0.05
}

fn default_hangover_high_peak_bac() -> f64 {
    0.12
}

fn default_hangover_high_drinks() -> f64 {
    6.0
}

fn default_hangover_medium_peak_bac() -> f64 {
    0.08
}

fn default_hangover_medium_drinks() -> f64 {
    3.0
}

fn default_hangover_clear_bac() -> f64 {
    0.02
}

fn default_recovery_hours() -> f64 {
    10.0
}

fn default_target_hours() -> f64 {
    12.0
}

fn default_pace_lookahead_hours() -> f64 {
    0.5
}

fn default_hydration_oz_per_drink() -> f64 {
    8.0
}

fn default_hydration_min_oz() -> f64 {
    8.0
}

fn default_recall_window_seconds() -> i64 {
    120
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("widmark_r_male", self.widmark_r_male),
            ("widmark_r_female", self.widmark_r_female),
            ("elimination_per_hour", self.elimination_per_hour),
            ("absorption_hours", self.absorption_hours),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!("model.{} must be positive", name)));
            }
        }
        if !(0.0..=1.0).contains(&self.absorption_onset_fraction) {
            return Err(Error::Config(
                "model.absorption_onset_fraction must be within 0..=1".into(),
            ));
        }
        if self.step_minutes == 0
            || self.lookback_minutes % self.step_minutes != 0
            || self.lookahead_minutes % self.step_minutes != 0
        {
            return Err(Error::Config(
                "model.step_minutes must be positive and divide the lookback and lookahead windows"
                    .into(),
            ));
        }
        if self.lookahead_minutes == 0 {
            return Err(Error::Config("model.lookahead_minutes must be positive".into()));
        }
        Ok(())
    }
}

impl AdvisoryConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.caution_bac > 0.0 && self.caution_bac < self.legal_limit_bac) {
            return Err(Error::Config(
                "advisory.caution_bac must be positive and below legal_limit_bac".into(),
            ));
        }
        if self.hangover_medium_peak_bac > self.hangover_high_peak_bac
            || self.hangover_medium_drinks > self.hangover_high_drinks
        {
            return Err(Error::Config(
                "advisory hangover medium cutoffs must not exceed the high cutoffs".into(),
            ));
        }
        let positive = [
            ("hangover_clear_bac", self.hangover_clear_bac),
            ("recovery_hours", self.recovery_hours),
            ("default_target_hours", self.default_target_hours),
            ("pace_lookahead_hours", self.pace_lookahead_hours),
            ("hydration_oz_per_drink", self.hydration_oz_per_drink),
            ("hydration_min_oz", self.hydration_min_oz),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!("advisory.{} must be positive", name)));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check every section for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.advisory.validate()?;
        if self.session.recall_window_seconds <= 0 {
            return Err(Error::Config(
                "session.recall_window_seconds must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("buddy").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.widmark_r_male, 0.68);
        assert_eq!(config.model.widmark_r_female, 0.55);
        assert_eq!(config.advisory.legal_limit_bac, 0.08);
        assert_eq!(config.session.recall_window_seconds, 120);
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.advisory.recovery_hours = 8.0;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.advisory, config.advisory);
        assert_eq!(loaded.model, config.model);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[model]
elimination_per_hour = 0.017
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.elimination_per_hour, 0.017);
        assert_eq!(config.model.widmark_r_male, 0.68); // default
        assert_eq!(config.advisory.caution_bac, 0.05); // default
    }

    #[test]
    fn test_rejects_step_that_does_not_divide_window() {
        let mut config = Config::default();
        config.model.step_minutes = 7;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_drive_thresholds() {
        let mut config = Config::default();
        config.advisory.caution_bac = 0.09;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[model]\nwidmark_r_male = -1.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
