//! Detector configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/subscout/config/subscout.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default. A few environment
//! variables are applied last, see [`Config::apply_env`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/subscout.toml");

/// Overrides the aggregator base URL
pub const POWENS_BASE_URL_ENV: &str = "POWENS_BASE_URL";

/// Overrides the scheduler interval, in hours
pub const SCHEDULE_HOURS_ENV: &str = "SUBSCOUT_SCHEDULE_HOURS";

/// Upper bound for every day threshold in `[detection]`
pub const MAX_THRESHOLD_DAYS: i64 = 3650;

/// Upper bound for `scheduler.interval_hours` (one year)
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

/// Thresholds of the detection pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Largest gap between the two earliest occurrences of a recurring cluster
    pub max_anchor_gap_days: i64,
    /// Prefix of the normalized wording used by the fuzzy fallback
    pub fuzzy_prefix_chars: usize,
    /// Largest Levenshtein distance the fuzzy fallback accepts
    pub fuzzy_max_distance: usize,
    pub monthly_max_days: i64,
    pub annual_max_days: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_anchor_gap_days: 93,
            fuzzy_prefix_chars: 10,
            fuzzy_max_distance: 3,
            monthly_max_days: 31,
            annual_max_days: 365,
        }
    }
}

/// Bank aggregator client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowensConfig {
    pub base_url: String,
    pub transaction_limit: u32,
    pub timeout_secs: u64,
}

impl Default for PowensConfig {
    fn default() -> Self {
        Self {
            base_url: "https://demo.biapi.pro/2.0".to_string(),
            transaction_limit: 30,
            timeout_secs: 30,
        }
    }
}

impl PowensConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logo lookup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.svgl.app".to_string(),
            timeout_secs: 5,
        }
    }
}

impl LogoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Periodic multi-user detection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_hours: u64,
    pub max_concurrent_users: usize,
    pub run_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            max_concurrent_users: 4,
            run_timeout_secs: 300,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub powens: PowensConfig,
    pub logo: LogoConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Load from the default override location or the embedded defaults
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load with an explicit override path; a missing file falls back to defaults
    pub fn load_from(override_path: Option<&Path>) -> Result<Self> {
        let path = override_path
            .map(Path::to_path_buf)
            .or_else(default_config_path);

        let mut config = match path {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                let content = fs::read_to_string(&p).map_err(|e| {
                    Error::InvalidData(format!("Failed to read config {}: {}", p.display(), e))
                })?;
                Self::parse(&content)?
            }
            _ => Self::parse(DEFAULT_CONFIG)?,
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content; absent keys keep their defaults
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `POWENS_BASE_URL` and `SUBSCOUT_SCHEDULE_HOURS`
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(POWENS_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.powens.base_url = url.trim().to_string();
            }
        }
        if let Ok(hours) = std::env::var(SCHEDULE_HOURS_ENV) {
            match hours.trim().parse::<u64>() {
                Ok(h) => self.scheduler.interval_hours = h,
                Err(_) => debug!("Ignoring non-numeric {}={}", SCHEDULE_HOURS_ENV, hours),
            }
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        for (name, days) in [
            ("max_anchor_gap_days", d.max_anchor_gap_days),
            ("monthly_max_days", d.monthly_max_days),
            ("annual_max_days", d.annual_max_days),
        ] {
            if !(0..=MAX_THRESHOLD_DAYS).contains(&days) {
                return Err(Error::InvalidData(format!(
                    "detection.{} must be between 0 and {}, got {}",
                    name, MAX_THRESHOLD_DAYS, days
                )));
            }
        }
        if d.monthly_max_days > d.annual_max_days {
            return Err(Error::InvalidData(
                "detection.monthly_max_days must not exceed annual_max_days".to_string(),
            ));
        }
        if !(1..=MAX_INTERVAL_HOURS).contains(&self.scheduler.interval_hours) {
            return Err(Error::InvalidData(format!(
                "scheduler.interval_hours must be between 1 and {}, got {}",
                MAX_INTERVAL_HOURS, self.scheduler.interval_hours
            )));
        }
        for (name, secs) in [
            ("scheduler.run_timeout_secs", self.scheduler.run_timeout_secs),
            ("logo.timeout_secs", self.logo.timeout_secs),
            ("powens.timeout_secs", self.powens.timeout_secs),
        ] {
            if secs == 0 {
                return Err(Error::InvalidData(format!("{} must be at least 1", name)));
            }
        }
        if self.scheduler.max_concurrent_users == 0 {
            return Err(Error::InvalidData(
                "scheduler.max_concurrent_users must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("subscout").join("config").join("subscout.toml"))
}
