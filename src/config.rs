//! Configuration for scoring and publishing runs
//!
//! Both configs are plain serde structs with a default for every field, so a
//! JSON file only needs to name what it overrides.

use crate::decay::{DecayModel, WeekendPolicy, BASELINE};
use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::reading::{utc_offset, DEFAULT_UTC_OFFSET_HOURS};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decay parameters for the weekday/weekend calendar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    #[serde(default = "default_baseline")]
    pub baseline: f64,

    /// Fraction of the gap to baseline closed per run on trading days
    #[serde(default = "default_weekday_rate")]
    pub weekday_rate: f64,

    /// Fraction closed per run on quiet days
    #[serde(default = "default_quiet_rate")]
    pub quiet_rate: f64,
}

fn default_baseline() -> f64 { BASELINE }
fn default_weekday_rate() -> f64 { 0.05 }
fn default_quiet_rate() -> f64 { 0.08 }

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            weekday_rate: default_weekday_rate(),
            quiet_rate: default_quiet_rate(),
        }
    }
}

impl DecayConfig {
    pub fn model(&self) -> DecayModel {
        DecayModel::new(self.baseline)
    }

    pub fn policy(&self) -> WeekendPolicy {
        WeekendPolicy::new(self.weekday_rate, self.quiet_rate)
    }
}

/// Configuration of a scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoiConfig {
    /// Names the state and reading files
    #[serde(default = "default_index_key")]
    pub index_key: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Also write the daily snapshot
    #[serde(default)]
    pub snapshot: bool,

    /// Reduce the signal contribution
    #[serde(default)]
    pub light_mode: bool,

    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    #[serde(default)]
    pub decay: DecayConfig,

    #[serde(default)]
    pub normalizer: Normalizer,
}

fn default_index_key() -> String { "moi".to_string() }
fn default_output_dir() -> PathBuf { PathBuf::from("data") }
fn default_utc_offset_hours() -> i32 { DEFAULT_UTC_OFFSET_HOURS }

impl Default for MoiConfig {
    fn default() -> Self {
        Self {
            index_key: default_index_key(),
            output_dir: default_output_dir(),
            snapshot: false,
            light_mode: false,
            utc_offset_hours: default_utc_offset_hours(),
            decay: DecayConfig::default(),
            normalizer: Normalizer::default(),
        }
    }
}

impl MoiConfig {
    /// Daily run that freezes the day's value
    pub fn snapshot() -> Self {
        Self {
            snapshot: true,
            ..Self::default()
        }
    }

    /// Reduced signal magnitude
    pub fn light() -> Self {
        Self {
            light_mode: true,
            ..Self::default()
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_index_key(mut self, key: impl Into<String>) -> Self {
        self.index_key = key.into();
        self
    }

    /// `<key>_state.json`
    pub fn state_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_state.json", self.index_key))
    }

    /// `<key>.json`
    pub fn reading_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.index_key))
    }

    /// `<key>_daily.json`
    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_daily.json", self.index_key))
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        offset_from_hours(self.utc_offset_hours)
    }

    /// Reject parameters that would break the bounded-score invariants
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.index_key)?;
        self.offset()?;

        for (name, rate) in [
            ("weekday_rate", self.decay.weekday_rate),
            ("quiet_rate", self.decay.quiet_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidConfig(format!(
                    "decay.{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.decay.baseline) {
            return Err(Error::InvalidConfig(format!(
                "decay.baseline must be within [0, 100], got {}",
                self.decay.baseline
            )));
        }

        if !(self.normalizer.sigma.is_finite() && self.normalizer.sigma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "normalizer.sigma must be positive, got {}",
                self.normalizer.sigma
            )));
        }

        if !self.normalizer.mean.is_finite() {
            return Err(Error::InvalidConfig("normalizer.mean must be finite".to_string()));
        }

        Ok(())
    }

    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Configuration of the artifact publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Where upstream renders `<key>_intraday.png` and `<key>_stats.json`
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Publicly served directory
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_staging_dir() -> PathBuf { PathBuf::from("docs/outputs") }
fn default_public_dir() -> PathBuf { PathBuf::from("docs/charts") }

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            public_dir: default_public_dir(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl PublishConfig {
    pub fn new(staging_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            public_dir: public_dir.into(),
            ..Self::default()
        }
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        offset_from_hours(self.utc_offset_hours)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        config.offset()?;
        Ok(config)
    }
}

fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    utc_offset(hours).ok_or_else(|| {
        Error::InvalidConfig(format!("utc_offset_hours out of range: {}", hours))
    })
}

/// Keys end up in file names, so path separators are refused
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidConfig("index key is empty".to_string()));
    }
    if key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(Error::InvalidConfig(format!(
            "index key must be a plain file name component: {:?}",
            key
        )));
    }
    Ok(())
}
