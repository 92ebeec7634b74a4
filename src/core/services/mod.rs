// src/core/services/mod.rs
pub mod authentication;
pub mod insights;
pub mod locks;

pub use authentication::{AuthDecision, AuthenticationService, Clock, LockoutView, Outcome, SystemClock};
pub use insights::GestureInsights;
