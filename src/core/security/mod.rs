// src/core/security/mod.rs
pub mod anti_spoofing;
pub mod events;
pub mod lockout;

pub use anti_spoofing::{AntiSpoofingAnalyzer, SpoofingReport};
pub use events::{SecurityEvent, SecurityEventLog, SecurityEventType, Severity, ThreatLevel};
pub use lockout::{LockStatus, LockoutPolicy, LockoutState};
