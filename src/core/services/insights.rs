// src/core/services/insights.rs
use serde::{Deserialize, Serialize};

use crate::core::gesture::{complexity, types::GestureSample};
use crate::core::security::anti_spoofing::SpoofingReport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureInsights {
    pub complexity: u8,
    /// 0-100, higher is harder to guess or replay.
    pub security_score: u8,
    pub recommendations: Vec<String>,
}

pub fn analyze(sample: &GestureSample, spoofing: &SpoofingReport) -> GestureInsights {
    let report = complexity::score(sample);
    let fluidity = report.biometric_profile.fluidity_score;
    let duration = sample.duration_ms();

    let mut score = f64::from(report.complexity) / 10.0 * 60.0
        + fluidity * 20.0
        + (duration / 5_000.0).min(1.0) * 20.0;
    if !spoofing.passed() {
        score -= 30.0;
    }
    let security_score = score.round().clamp(0.0, 100.0) as u8;

    let mut recommendations = Vec::new();
    if sample.len() < 6 {
        recommendations.push("Add more distinct points to the gesture".to_string());
    }
    if report.complexity < 5 {
        recommendations.push("Use wider movements that cover more of the capture area".to_string());
    }
    if duration < 2_000.0 {
        recommendations.push("Perform the gesture more slowly".to_string());
    }
    if fluidity < 0.5 {
        recommendations.push("Add sharper changes of direction so the path is harder to trace".to_string());
    }
    for reason in spoofing.reasons() {
        let advice = match reason.as_str() {
            "too_perfect_timing" => "Capture timing looks scripted; perform the gesture by hand",
            "unnatural_acceleration" => "Movement contains jumps; keep the hand in view for the whole gesture",
            "flat_depth_profile" => "Depth barely changes; move the hand toward or away from the camera",
            _ => "Capture looks unreliable; try recording again",
        };
        recommendations.push(advice.to_string());
    }

    GestureInsights {
        complexity: report.complexity,
        security_score,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture::types::Point3;
    use crate::core::security::anti_spoofing::AntiSpoofingAnalyzer;
    use crate::utils::config::Config;

    fn report_for(sample: &GestureSample) -> SpoofingReport {
        AntiSpoofingAnalyzer::new(Config::default().anti_spoofing).analyze(sample)
    }

    fn rich_sample() -> GestureSample {
        let positions = (0..10)
            .map(|i| {
                let x = if i % 2 == 0 { 0.2 } else { 0.8 };
                Point3::new(x, 0.05 + 0.09 * i as f64, 0.4 + 0.02 * i as f64)
            })
            .collect();
        let timing = vec![0.0, 520.0, 1130.0, 1610.0, 2290.0, 2800.0, 3420.0, 3950.0, 4700.0, 5200.0];
        GestureSample::new(positions, timing)
    }

    #[test]
    fn test_simple_gesture_gets_advice() {
        let sample = GestureSample::new(
            vec![Point3::new(0.1, 0.1, 0.5), Point3::new(0.2, 0.1, 0.5), Point3::new(0.3, 0.12, 0.5)],
            vec![0.0, 480.0, 1100.0],
        );
        let insights = analyze(&sample, &report_for(&sample));

        assert_eq!(insights.complexity, 3);
        assert!(insights.security_score < 60);
        assert!(insights.recommendations.len() >= 3);
    }

    #[test]
    fn test_rich_gesture_scores_higher() {
        let sample = rich_sample();
        let insights = analyze(&sample, &report_for(&sample));

        assert!(insights.security_score >= 70, "score {}", insights.security_score);
        assert!(insights.complexity >= 6);
        assert!(!insights.recommendations.iter().any(|r| r.contains("direction")));
    }

    #[test]
    fn test_long_straight_gesture_asks_for_turns() {
        let positions = (0..10).map(|i| Point3::new(0.05 + 0.09 * i as f64, 0.5, 0.5)).collect();
        let timing = vec![0.0, 520.0, 1130.0, 1610.0, 2290.0, 2800.0, 3420.0, 3950.0, 4700.0, 5200.0];
        let sample = GestureSample::new(positions, timing);
        let insights = analyze(&sample, &report_for(&sample));

        assert!(insights.recommendations.iter().any(|r| r.contains("direction")));
    }

    #[test]
    fn test_spoofing_flags_lower_score() {
        let mut scripted = rich_sample();
        scripted.timing = (0..10).map(|i| i as f64 * 500.0).collect();

        let clean = analyze(&rich_sample(), &report_for(&rich_sample()));
        let flagged = analyze(&scripted, &report_for(&scripted));

        assert!(flagged.security_score < clean.security_score);
        assert!(flagged.recommendations.iter().any(|r| r.contains("scripted")));
    }
}
