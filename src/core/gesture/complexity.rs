// src/core/gesture/complexity.rs
use tracing::debug;

use super::geometry::{angle_degrees, distance3d, mean_and_variance};
use super::types::{BiometricProfile, GestureSample};

const SHARP_TURN_DEGREES: f64 = 90.0;
const SHARP_TURN_PENALTY: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityReport {
    pub complexity: u8,
    pub biometric_profile: BiometricProfile,
}

/// Rates a validated sample and derives its biometric descriptors.
pub fn score(sample: &GestureSample) -> ComplexityReport {
    let complexity = complexity(sample);
    let biometric_profile = BiometricProfile {
        hand_size: None,
        finger_lengths: None,
        gesture_speed: gesture_speed(sample),
        fluidity_score: fluidity_score(sample),
    };

    debug!(
        points = sample.len(),
        complexity,
        speed = biometric_profile.gesture_speed,
        fluidity = biometric_profile.fluidity_score,
        "Scored gesture sample"
    );

    ComplexityReport {
        complexity,
        biometric_profile,
    }
}

/// `1 + 0.5·N + 0.1·path length + 0.01·Var(timestamps in seconds)`,
/// rounded into [1, 10].
///
/// Millisecond timestamps put the variance term in the thousands for any
/// sample that passes validation, so it is taken over seconds.
pub fn complexity(sample: &GestureSample) -> u8 {
    let n = sample.len() as f64;
    let seconds: Vec<f64> = sample.timing.iter().map(|t| t / 1000.0).collect();
    let (_, timing_variance) = mean_and_variance(&seconds);

    let raw = 1.0 + 0.5 * n + 0.1 * path_length(sample) + 0.01 * timing_variance;
    raw.round().clamp(1.0, 10.0) as u8
}

pub fn path_length(sample: &GestureSample) -> f64 {
    sample
        .positions
        .windows(2)
        .map(|w| distance3d(&w[0], &w[1]))
        .sum()
}

/// Mean per-segment speed in position units per millisecond. Segments with
/// no elapsed time count as speed 0.
pub fn gesture_speed(sample: &GestureSample) -> f64 {
    let segments = sample.positions.len().min(sample.timing.len()).saturating_sub(1);
    if segments == 0 {
        return 0.0;
    }

    let total: f64 = (1..=segments)
        .map(|i| {
            let dt = sample.timing[i] - sample.timing[i - 1];
            if dt > 0.0 {
                distance3d(&sample.positions[i - 1], &sample.positions[i]) / dt
            } else {
                0.0
            }
        })
        .sum();

    total / segments as f64
}

/// Starts at 1.0 and loses 0.1 for every triple whose turn angle is under
/// 90°. Triples with a zero-length segment carry no direction and are skipped.
pub fn fluidity_score(sample: &GestureSample) -> f64 {
    let sharp_turns = sample
        .positions
        .windows(3)
        .filter_map(|w| angle_degrees(&w[0], &w[1], &w[2]).ok())
        .filter(|angle| *angle < SHARP_TURN_DEGREES)
        .count();

    (1.0 - SHARP_TURN_PENALTY * sharp_turns as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture::types::Point3;

    fn line(n: usize) -> GestureSample {
        let positions = (0..n).map(|i| Point3::new(0.1 * i as f64, 0.1, 0.5)).collect();
        let timing = (0..n).map(|i| i as f64 * 300.0).collect();
        GestureSample::new(positions, timing)
    }

    #[test]
    fn test_complexity_formula() {
        // 5 points, path 0.4, timestamps 0..1.2s
        let sample = line(5);
        let raw: f64 = 1.0 + 2.5 + 0.04 + 0.01 * 0.18;
        assert_eq!(complexity(&sample), raw.round() as u8);
        assert_eq!(complexity(&sample), 4);
    }

    #[test]
    fn test_timing_variance_measured_in_seconds() {
        // Var over ms would be ~214616 and saturate the score at 10
        let mut sample = line(5);
        sample.timing = vec![0.0, 310.0, 590.0, 940.0, 1320.0];
        assert_eq!(complexity(&sample), 4);
    }

    #[test]
    fn test_complexity_never_decreases_with_more_points() {
        let mut previous = 0;
        for n in 3..=10 {
            let c = complexity(&line(n));
            assert!(c >= previous, "{} points scored {} after {}", n, c, previous);
            assert!((1..=10).contains(&c));
            previous = c;
        }
    }

    #[test]
    fn test_complexity_is_clamped() {
        let positions = (0..10)
            .map(|i| if i % 2 == 0 { Point3::new(0.0, 0.0, 0.0) } else { Point3::new(10.0, 10.0, 10.0) })
            .collect();
        let timing = (0..10).map(|i| i as f64 * 1000.0).collect();
        assert_eq!(complexity(&GestureSample::new(positions, timing)), 10);
    }

    #[test]
    fn test_speed_ignores_zero_intervals() {
        let sample = GestureSample::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.5, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0.0, 0.0, 500.0],
        );
        // first segment contributes 0, second 0.5/500
        assert!((gesture_speed(&sample) - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_fluidity_counts_turns_under_ninety_degrees() {
        // every interior triple of a straight line turns 0°
        assert!((fluidity_score(&line(6)) - 0.6).abs() < 1e-9);
        assert!((fluidity_score(&line(10)) - 0.2).abs() < 1e-9);

        let zigzag = GestureSample::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(0.0, 0.1, 0.0),
                Point3::new(0.5, 0.2, 0.0),
                Point3::new(0.0, 0.3, 0.0),
            ],
            vec![0.0, 300.0, 600.0, 900.0, 1200.0],
        );
        assert_eq!(fluidity_score(&zigzag), 1.0);

        let hairpin = GestureSample::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.2, 0.0, 0.0), Point3::new(0.1, 0.3, 0.0)],
            vec![0.0, 500.0, 1000.0],
        );
        assert_eq!(fluidity_score(&hairpin), 1.0);
    }

    #[test]
    fn test_fluidity_skips_degenerate_triples() {
        let sample = GestureSample::new(
            vec![Point3::new(0.2, 0.2, 0.2), Point3::new(0.2, 0.2, 0.2), Point3::new(0.4, 0.2, 0.2)],
            vec![0.0, 500.0, 1000.0],
        );
        assert_eq!(fluidity_score(&sample), 1.0);
    }

    #[test]
    fn test_profile_placeholders_are_unset() {
        let report = score(&line(4));
        assert!(report.biometric_profile.hand_size.is_none());
        assert!(report.biometric_profile.finger_lengths.is_none());
    }
}
