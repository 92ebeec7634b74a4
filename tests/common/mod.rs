// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gesturekey::{
    core::services::authentication::{AuthenticationService, Clock},
    storage::MemoryStore,
    utils::config::Config,
    GestureSample, Point3,
};
use parking_lot::Mutex;

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub struct TestContext {
    pub service: Arc<AuthenticationService>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let service = AuthenticationService::with_clock(
            &config,
            store.clone(),
            store.clone(),
            clock.clone(),
        )
        .expect("Failed to build service");

        Self {
            service: Arc::new(service),
            store,
            clock,
            config,
        }
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.encryption_secret = "integration-secret".to_string();
    config.storage.kdf_iterations = 1_000;
    config
}

/// A hand-drawn looking gesture with irregular frame spacing.
pub fn enrolled_sample() -> GestureSample {
    GestureSample::new(
        vec![
            Point3::new(0.10, 0.10, 0.50),
            Point3::new(0.25, 0.18, 0.52),
            Point3::new(0.41, 0.30, 0.49),
            Point3::new(0.55, 0.47, 0.55),
            Point3::new(0.70, 0.62, 0.51),
        ],
        vec![0.0, 310.0, 590.0, 940.0, 1320.0],
    )
}

/// Close to the enrolled gesture, as a second human attempt would be.
pub fn matching_attempt() -> GestureSample {
    GestureSample::new(
        vec![
            Point3::new(0.11, 0.12, 0.50),
            Point3::new(0.27, 0.17, 0.53),
            Point3::new(0.39, 0.33, 0.50),
            Point3::new(0.57, 0.45, 0.54),
            Point3::new(0.68, 0.64, 0.52),
        ],
        vec![0.0, 330.0, 570.0, 980.0, 1290.0],
    )
}

/// A different shape with natural timing.
pub fn wrong_attempt() -> GestureSample {
    GestureSample::new(
        vec![
            Point3::new(0.80, 0.10, 0.50),
            Point3::new(0.62, 0.25, 0.52),
            Point3::new(0.45, 0.31, 0.49),
            Point3::new(0.30, 0.52, 0.55),
            Point3::new(0.12, 0.70, 0.51),
        ],
        vec![0.0, 290.0, 610.0, 920.0, 1350.0],
    )
}

/// Evenly spaced frames, the signature of a scripted replay.
pub fn scripted_attempt() -> GestureSample {
    let mut sample = enrolled_sample();
    sample.timing = vec![0.0, 250.0, 500.0, 750.0, 1000.0];
    sample
}
