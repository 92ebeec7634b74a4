// src/utils/config.rs
use serde::Deserialize;
use std::path::Path;
use chrono::Duration;
use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use crate::utils::error::{Result, AuthError};

pub const MIN_POSITION_TOLERANCE: f64 = 0.05;
pub const MAX_POSITION_TOLERANCE: f64 = 0.5;
pub const MIN_TIMING_TOLERANCE: f64 = 0.1;
pub const MAX_TIMING_TOLERANCE: f64 = 0.5;
pub const MAX_LOCK_DURATION_MS: u64 = 365 * 24 * 60 * 60 * 1000;
pub const MAX_RETENTION_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub matching: MatchingConfig,
    pub lockout: LockoutConfig,
    pub anti_spoofing: AntiSpoofingConfig,
    pub storage: StorageConfig,
    pub events: EventConfig,
    pub logging: LoggingConfig,
}

/// Tolerances handed to every newly registered template.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    pub position_tolerance: f64,
    pub timing_tolerance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    pub max_attempts: u32,
    pub lock_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AntiSpoofingConfig {
    /// Mean frame-to-frame depth change a live hand must exceed.
    pub min_depth_variation: f64,
    /// Velocities are measured in position units per second.
    pub max_acceleration: f64,
    /// Inter-frame interval variance (ms²) below which timing is too regular.
    pub min_timing_variance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub encryption_secret: String,
    pub kdf_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub retention_hours: i64,
    pub threat_window_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matching: MatchingConfig {
                position_tolerance: 0.15,
                timing_tolerance: 0.3,
            },
            lockout: LockoutConfig {
                max_attempts: 5,
                lock_duration_ms: 2 * 60 * 60 * 1000,
            },
            anti_spoofing: AntiSpoofingConfig {
                min_depth_variation: 0.1,
                max_acceleration: 100.0,
                min_timing_variance: 0.01,
            },
            storage: StorageConfig {
                encryption_secret: String::new(),
                kdf_iterations: 100_000,
            },
            events: EventConfig {
                retention_hours: 24 * 30,
                threat_window_minutes: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}

impl Config {
    /// Loads `config/default`, `config/local` and `GESTURE__*` environment overrides.
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. GESTURE__LOCKOUT__MAX_ATTEMPTS=3
            .add_source(Environment::with_prefix("GESTURE").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_str()
            .ok_or_else(|| AuthError::Config("config path is not valid UTF-8".into()))?;

        let config = Self::builder_with_defaults()?
            .add_source(File::with_name(path))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = Self::default();
        let builder = ConfigLib::builder()
            .set_default("matching.position_tolerance", defaults.matching.position_tolerance)?
            .set_default("matching.timing_tolerance", defaults.matching.timing_tolerance)?
            .set_default("lockout.max_attempts", defaults.lockout.max_attempts as i64)?
            .set_default("lockout.lock_duration_ms", defaults.lockout.lock_duration_ms as i64)?
            .set_default("anti_spoofing.min_depth_variation", defaults.anti_spoofing.min_depth_variation)?
            .set_default("anti_spoofing.max_acceleration", defaults.anti_spoofing.max_acceleration)?
            .set_default("anti_spoofing.min_timing_variance", defaults.anti_spoofing.min_timing_variance)?
            .set_default("storage.encryption_secret", defaults.storage.encryption_secret)?
            .set_default("storage.kdf_iterations", defaults.storage.kdf_iterations as i64)?
            .set_default("events.retention_hours", defaults.events.retention_hours)?
            .set_default("events.threat_window_minutes", defaults.events.threat_window_minutes)?
            .set_default("logging.level", defaults.logging.level)?;

        Ok(builder)
    }

    pub fn validate(&self) -> Result<()> {
        // Matching
        validate_tolerance(self.matching.position_tolerance, self.matching.timing_tolerance)?;

        // Lockout
        if self.lockout.max_attempts == 0 {
            return Err(AuthError::Config("lockout.max_attempts must be greater than 0".into()));
        }
        if !(1..=MAX_LOCK_DURATION_MS).contains(&self.lockout.lock_duration_ms) {
            return Err(AuthError::Config(format!(
                "lockout.lock_duration_ms must be between 1 and {}", MAX_LOCK_DURATION_MS
            )));
        }

        // Anti-spoofing
        let spoofing = &self.anti_spoofing;
        for (name, value) in [
            ("min_depth_variation", spoofing.min_depth_variation),
            ("max_acceleration", spoofing.max_acceleration),
            ("min_timing_variance", spoofing.min_timing_variance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AuthError::Config(format!(
                    "anti_spoofing.{} must be a non-negative number", name
                )));
            }
        }

        // Storage
        if self.storage.encryption_secret.is_empty() {
            return Err(AuthError::Config("storage.encryption_secret must be set".into()));
        }
        if self.storage.kdf_iterations < 1_000 {
            return Err(AuthError::Config("storage.kdf_iterations must be at least 1000".into()));
        }

        // Events
        if !(1..=MAX_RETENTION_HOURS).contains(&self.events.retention_hours) {
            return Err(AuthError::Config(format!(
                "events.retention_hours must be between 1 and {}", MAX_RETENTION_HOURS
            )));
        }
        if !(1..=self.events.retention_hours * 60).contains(&self.events.threat_window_minutes) {
            return Err(AuthError::Config(
                "events.threat_window_minutes must be positive and within the retention period".into(),
            ));
        }

        Ok(())
    }

    pub fn get_lock_duration(&self) -> Result<Duration> {
        i64::try_from(self.lockout.lock_duration_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "lockout.lock_duration_ms {} is out of range", self.lockout.lock_duration_ms
                ))
            })
    }

    pub fn get_event_retention(&self) -> Duration {
        Duration::hours(self.events.retention_hours)
    }

    pub fn get_threat_window(&self) -> Duration {
        Duration::minutes(self.events.threat_window_minutes)
    }
}

pub fn validate_tolerance(position: f64, timing: f64) -> Result<()> {
    if !(MIN_POSITION_TOLERANCE..=MAX_POSITION_TOLERANCE).contains(&position) {
        return Err(AuthError::Config(format!(
            "position tolerance {} outside [{}, {}]",
            position, MIN_POSITION_TOLERANCE, MAX_POSITION_TOLERANCE
        )));
    }
    if !(MIN_TIMING_TOLERANCE..=MAX_TIMING_TOLERANCE).contains(&timing) {
        return Err(AuthError::Config(format!(
            "timing tolerance {} outside [{}, {}]",
            timing, MIN_TIMING_TOLERANCE, MAX_TIMING_TOLERANCE
        )));
    }
    Ok(())
}

impl From<ConfigError> for AuthError {
    fn from(error: ConfigError) -> Self {
        AuthError::Config(error.to_string())
    }
}
