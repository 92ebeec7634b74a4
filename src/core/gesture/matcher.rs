// src/core/gesture/matcher.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::distance3d;
use super::types::{GestureSample, GestureTemplate, Tolerance};
use crate::storage::cipher::TemplateCipher;
use crate::utils::error::{AuthError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Both position and timing stayed within tolerance at every index.
    pub success: bool,
    /// Soft similarity in [0, 1]; informational, never the gate.
    pub confidence: f64,
}

/// Breakdown of one comparison, without side effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub position_match: bool,
    pub timing_match: bool,
    pub position_confidence: f64,
    pub timing_confidence: f64,
    pub confidence: f64,
}

impl MatchScore {
    pub fn success(&self) -> bool {
        self.position_match && self.timing_match
    }
}

pub struct GestureMatcher {
    cipher: Arc<TemplateCipher>,
}

impl GestureMatcher {
    pub fn new(cipher: Arc<TemplateCipher>) -> Self {
        Self { cipher }
    }

    /// Compares `live` with the template's stored sample and records the
    /// attempt in the template's usage stats. A template whose sample cannot
    /// be opened is left untouched.
    pub fn validate(
        &self,
        template: &mut GestureTemplate,
        live: &GestureSample,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        let stored = self.cipher.open(&template.sample).map_err(|e| {
            warn!(template_id = %template.id, error = %e, "Stored gesture sample could not be opened");
            AuthError::TemplateCorrupt(e.to_string())
        })?;

        let score = compare(&stored, live, &template.tolerance);
        let outcome = MatchOutcome {
            success: score.success(),
            confidence: score.confidence,
        };

        template.usage_stats.record(outcome.success, outcome.confidence, now);

        debug!(
            template_id = %template.id,
            position_match = score.position_match,
            timing_match = score.timing_match,
            confidence = outcome.confidence,
            "Gesture compared"
        );

        Ok(outcome)
    }
}

/// Index-wise comparison over the shorter of the two samples.
pub fn compare(stored: &GestureSample, live: &GestureSample, tolerance: &Tolerance) -> MatchScore {
    let position_match = positions_match(stored, live, tolerance.position);
    let timing_match = timing_matches(stored, live, tolerance.timing);

    let position_confidence = position_confidence(stored, live, tolerance.position);
    let timing_confidence = timing_confidence(stored, live, tolerance.timing);
    let confidence = ((position_confidence + timing_confidence) / 2.0 * coverage(stored, live))
        .clamp(0.0, 1.0);

    MatchScore {
        position_match,
        timing_match,
        position_confidence,
        timing_confidence,
        confidence,
    }
}

fn common_len(stored: &GestureSample, live: &GestureSample) -> usize {
    stored.positions.len().min(live.positions.len())
}

fn common_timing_len(stored: &GestureSample, live: &GestureSample) -> usize {
    stored.timing.len().min(live.timing.len())
}

/// Share of the longer sample that the comparison actually covers.
fn coverage(stored: &GestureSample, live: &GestureSample) -> f64 {
    let longest = stored.len().max(live.len());
    if longest == 0 {
        0.0
    } else {
        common_len(stored, live) as f64 / longest as f64
    }
}

pub fn positions_match(stored: &GestureSample, live: &GestureSample, tolerance: f64) -> bool {
    stored
        .positions
        .iter()
        .zip(&live.positions)
        .all(|(a, b)| distance3d(a, b) <= tolerance)
}

/// Relative timestamp difference at one index. `None` when it cannot be
/// expressed: the stored timestamp is zero but the live one is not.
pub fn relative_timing_diff(stored: f64, live: f64) -> Option<f64> {
    if stored == 0.0 {
        if live == 0.0 { Some(0.0) } else { None }
    } else {
        Some((stored - live).abs() / stored.abs())
    }
}

pub fn timing_matches(stored: &GestureSample, live: &GestureSample, tolerance: f64) -> bool {
    stored
        .timing
        .iter()
        .zip(&live.timing)
        .all(|(s, l)| matches!(relative_timing_diff(*s, *l), Some(diff) if diff <= tolerance))
}

// Soft scores decay linearly and reach zero at twice the tolerance, so a
// near miss still reads as fairly similar.

fn position_confidence(stored: &GestureSample, live: &GestureSample, tolerance: f64) -> f64 {
    let n = common_len(stored, live);
    if n == 0 {
        return 0.0;
    }
    let total: f64 = stored
        .positions
        .iter()
        .zip(&live.positions)
        .map(|(a, b)| soft_score(distance3d(a, b), tolerance))
        .sum();
    total / n as f64
}

fn timing_confidence(stored: &GestureSample, live: &GestureSample, tolerance: f64) -> f64 {
    let n = common_timing_len(stored, live);
    if n == 0 {
        return 0.0;
    }
    let total: f64 = stored
        .timing
        .iter()
        .zip(&live.timing)
        .map(|(s, l)| match relative_timing_diff(*s, *l) {
            Some(diff) => soft_score(diff, tolerance),
            None => 0.0,
        })
        .sum();
    total / n as f64
}

fn soft_score(deviation: f64, tolerance: f64) -> f64 {
    (1.0 - deviation / (2.0 * tolerance)).clamp(0.0, 1.0)
}
