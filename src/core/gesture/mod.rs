// src/core/gesture/mod.rs
pub mod complexity;
pub mod geometry;
pub mod matcher;
pub mod types;

pub use matcher::{GestureMatcher, MatchOutcome};
pub use types::{
    BiometricProfile, GestureSample, GestureTemplate, Point3, TemplateSummary, Tolerance, UsageStats,
};
