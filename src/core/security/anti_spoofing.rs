// src/core/security/anti_spoofing.rs
//! Liveness heuristics applied to a live sample before it is matched.
//!
//! Each check runs independently. Any suspicious check rejects the attempt,
//! and a check that cannot produce a finite measurement counts as suspicious.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::events::Severity;
use crate::core::gesture::geometry::{mean_and_variance, velocity};
use crate::core::gesture::types::GestureSample;
use crate::utils::config::AntiSpoofingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoofingCheck {
    DepthConsistency,
    MotionPattern,
    TimingPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: SpoofingCheck,
    pub suspicious: bool,
    pub severity: Option<Severity>,
    pub reason: Option<String>,
    /// The statistic the check compared against its threshold.
    pub measured: Option<f64>,
}

impl CheckResult {
    fn pass(check: SpoofingCheck, measured: f64) -> Self {
        Self {
            check,
            suspicious: false,
            severity: None,
            reason: None,
            measured: Some(measured),
        }
    }

    fn flag(check: SpoofingCheck, severity: Severity, reason: &str, measured: Option<f64>) -> Self {
        Self {
            check,
            suspicious: true,
            severity: Some(severity),
            reason: Some(reason.to_string()),
            measured,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoofingReport {
    pub checks: Vec<CheckResult>,
}

impl SpoofingReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| !c.suspicious)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.suspicious)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.flagged().filter_map(|c| c.reason.clone()).collect()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.flagged().filter_map(|c| c.severity).max()
    }
}

pub struct AntiSpoofingAnalyzer {
    config: AntiSpoofingConfig,
}

impl AntiSpoofingAnalyzer {
    pub fn new(config: AntiSpoofingConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, sample: &GestureSample) -> SpoofingReport {
        let mut checks = Vec::with_capacity(3);
        if let Some(depth) = &sample.depth {
            checks.push(self.check_depth(depth));
        }
        checks.push(self.check_motion(sample));
        checks.push(self.check_timing(sample));

        let report = SpoofingReport { checks };
        if report.passed() {
            debug!("Live sample passed liveness checks");
        } else {
            warn!(reasons = ?report.reasons(), "Live sample flagged by liveness checks");
        }
        report
    }

    /// A flat photo or screen replay barely changes depth between frames.
    pub fn check_depth(&self, depth: &[f64]) -> CheckResult {
        let deltas: Vec<f64> = depth.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let (mean_delta, _) = mean_and_variance(&deltas);

        if deltas.is_empty() || !mean_delta.is_finite() {
            return CheckResult::flag(SpoofingCheck::DepthConsistency, Severity::High, "depth_unmeasurable", None);
        }
        if mean_delta <= self.config.min_depth_variation {
            return CheckResult::flag(
                SpoofingCheck::DepthConsistency,
                Severity::High,
                "flat_depth_profile",
                Some(mean_delta),
            );
        }
        CheckResult::pass(SpoofingCheck::DepthConsistency, mean_delta)
    }

    /// Velocity in position units per second; frames sharing a timestamp
    /// carry no velocity and are skipped.
    pub fn check_motion(&self, sample: &GestureSample) -> CheckResult {
        let velocities: Vec<f64> = sample
            .positions
            .windows(2)
            .zip(sample.timing.windows(2))
            .filter_map(|(p, t)| velocity(&p[0], &p[1], (t[1] - t[0]) / 1000.0))
            .collect();

        let max_acceleration = velocities
            .windows(2)
            .map(|v| (v[1] - v[0]).abs())
            .fold(0.0_f64, f64::max);

        if !max_acceleration.is_finite() || velocities.iter().any(|v| !v.is_finite()) {
            return CheckResult::flag(SpoofingCheck::MotionPattern, Severity::Medium, "motion_unmeasurable", None);
        }
        if max_acceleration > self.config.max_acceleration {
            return CheckResult::flag(
                SpoofingCheck::MotionPattern,
                Severity::Medium,
                "unnatural_acceleration",
                Some(max_acceleration),
            );
        }
        CheckResult::pass(SpoofingCheck::MotionPattern, max_acceleration)
    }

    /// Human capture jitters; evenly spaced frames point at a script.
    pub fn check_timing(&self, sample: &GestureSample) -> CheckResult {
        let intervals: Vec<f64> = sample.timing.windows(2).map(|w| w[1] - w[0]).collect();
        let (_, variance) = mean_and_variance(&intervals);

        if intervals.is_empty() || !variance.is_finite() {
            return CheckResult::flag(SpoofingCheck::TimingPattern, Severity::High, "timing_unmeasurable", None);
        }
        if variance < self.config.min_timing_variance {
            return CheckResult::flag(
                SpoofingCheck::TimingPattern,
                Severity::High,
                "too_perfect_timing",
                Some(variance),
            );
        }
        CheckResult::pass(SpoofingCheck::TimingPattern, variance)
    }
}
