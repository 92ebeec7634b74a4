// src/core/gesture/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::cipher::SealedSample;
use crate::utils::config::validate_tolerance;
use crate::utils::error::{AuthError, Result};

pub const MIN_POINTS: usize = 3;
pub const MAX_POINTS: usize = 10;
pub const MIN_DURATION_MS: f64 = 1_000.0;
pub const MAX_DURATION_MS: f64 = 10_000.0;

/// A position in normalized camera-relative space; `z` is depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A captured gesture: parallel position and timestamp series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub positions: Vec<Point3>,
    /// Milliseconds since the start of the capture.
    pub timing: Vec<f64>,
    /// Per-frame sensor depth, when the capture device reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Vec<f64>>,
}

impl GestureSample {
    pub fn new(positions: Vec<Point3>, timing: Vec<f64>) -> Self {
        Self {
            positions,
            timing,
            depth: None,
        }
    }

    pub fn with_depth(mut self, depth: Vec<f64>) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn duration_ms(&self) -> f64 {
        match (self.timing.first(), self.timing.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Checks shape and timing invariants required of every registration or
    /// login attempt.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if n != self.timing.len() {
            return Err(AuthError::InputShape(format!(
                "{} positions but {} timestamps", n, self.timing.len()
            )));
        }
        if !(MIN_POINTS..=MAX_POINTS).contains(&n) {
            return Err(AuthError::InputShape(format!(
                "expected {}-{} points, got {}", MIN_POINTS, MAX_POINTS, n
            )));
        }
        if let Some(depth) = &self.depth {
            if depth.len() != n {
                return Err(AuthError::InputShape(format!(
                    "{} positions but {} depth readings", n, depth.len()
                )));
            }
            if depth.iter().any(|d| !d.is_finite()) {
                return Err(AuthError::InputShape("non-finite depth reading".into()));
            }
        }
        if self.positions.iter().any(|p| !p.is_finite()) {
            return Err(AuthError::InputShape("non-finite coordinate".into()));
        }
        if self.timing.iter().any(|t| !t.is_finite()) {
            return Err(AuthError::InputShape("non-finite timestamp".into()));
        }
        if self.timing.windows(2).any(|w| w[1] < w[0]) {
            return Err(AuthError::InputShape("timestamps must be non-decreasing".into()));
        }

        let duration = self.duration_ms();
        if !(MIN_DURATION_MS..=MAX_DURATION_MS).contains(&duration) {
            return Err(AuthError::InputShape(format!(
                "duration {}ms outside [{}, {}]ms", duration, MIN_DURATION_MS, MAX_DURATION_MS
            )));
        }

        Ok(())
    }
}

/// Allowed deviation between a live sample and the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Maximum Euclidean distance per point.
    pub position: f64,
    /// Maximum relative timestamp difference per point.
    pub timing: f64,
}

impl Tolerance {
    pub fn new(position: f64, timing: f64) -> Result<Self> {
        validate_tolerance(position, timing)?;
        Ok(Self { position, timing })
    }
}

/// Descriptors derived from the registered sample.
///
/// `hand_size` and `finger_lengths` are not measured from capture data; the
/// fields exist so stored documents keep their shape once real hand geometry
/// is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricProfile {
    pub hand_size: Option<f64>,
    pub finger_lengths: Option<Vec<f64>>,
    /// Mean position units per millisecond.
    pub gesture_speed: f64,
    pub fluidity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_attempts: u64,
    pub successful_attempts: u64,
    pub failed_attempts: u64,
    pub average_confidence: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn record(&mut self, success: bool, confidence: f64, now: DateTime<Utc>) {
        self.total_attempts += 1;
        if success {
            self.successful_attempts += 1;
        } else {
            self.failed_attempts += 1;
        }

        let n = self.total_attempts as f64;
        self.average_confidence += (confidence - self.average_confidence) / n;
        self.last_used = Some(now);
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.successful_attempts as f64 / self.total_attempts as f64
        }
    }
}

/// The stored credential for one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureTemplate {
    pub id: Uuid,
    pub identity: Uuid,
    pub sample: SealedSample,
    pub complexity: u8,
    pub biometric_profile: BiometricProfile,
    pub tolerance: Tolerance,
    pub usage_stats: UsageStats,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl GestureTemplate {
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            template_id: self.id,
            identity: self.identity,
            complexity: self.complexity,
            biometric_profile: self.biometric_profile.clone(),
            tolerance: self.tolerance,
            usage_stats: self.usage_stats.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.deactivated_at = Some(now);
        self.updated_at = now;
    }
}

/// What callers get back; never contains the sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub template_id: Uuid,
    pub identity: Uuid,
    pub complexity: u8,
    pub biometric_profile: BiometricProfile,
    pub tolerance: Tolerance,
    pub usage_stats: UsageStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timing: Vec<f64>) -> GestureSample {
        let positions = (0..timing.len())
            .map(|i| Point3::new(0.1 * i as f64, 0.2, 0.5))
            .collect();
        GestureSample::new(positions, timing)
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut s = sample(vec![0.0, 500.0, 1200.0]);
        s.timing.push(1500.0);
        assert!(matches!(s.validate(), Err(AuthError::InputShape(_))));
    }

    #[test]
    fn test_point_count_bounds() {
        assert!(sample(vec![0.0, 1500.0]).validate().is_err());
        assert!(sample(vec![0.0, 700.0, 1500.0]).validate().is_ok());

        let eleven: Vec<f64> = (0..11).map(|i| i as f64 * 150.0).collect();
        assert!(sample(eleven).validate().is_err());
    }

    #[test]
    fn test_duration_bounds() {
        assert!(sample(vec![0.0, 400.0, 999.0]).validate().is_err());
        assert!(sample(vec![0.0, 400.0, 1000.0]).validate().is_ok());
        assert!(sample(vec![0.0, 4000.0, 10_000.0]).validate().is_ok());
        assert!(sample(vec![0.0, 4000.0, 10_001.0]).validate().is_err());
    }

    #[test]
    fn test_decreasing_timestamps_rejected() {
        assert!(sample(vec![0.0, 900.0, 800.0, 1500.0]).validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut s = sample(vec![0.0, 600.0, 1200.0]);
        s.positions[1].y = f64::NAN;
        assert!(s.validate().is_err());

        let s = sample(vec![0.0, 600.0, 1200.0]).with_depth(vec![0.5, 0.6]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_usage_stats_running_average() {
        let mut stats = UsageStats::default();
        let now = Utc::now();
        stats.record(true, 1.0, now);
        stats.record(false, 0.5, now);
        stats.record(false, 0.0, now);

        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.successful_attempts, 1);
        assert_eq!(stats.failed_attempts, 2);
        assert!((stats.average_confidence - 0.5).abs() < 1e-12);
        assert!((stats.success_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.last_used, Some(now));
    }

    #[test]
    fn test_tolerance_constructor_validates() {
        assert!(Tolerance::new(0.15, 0.3).is_ok());
        assert!(Tolerance::new(0.6, 0.3).is_err());
    }
}
