// src/core/security/events.rs
use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    fn weight(self) -> u32 {
        match self {
            Severity::Info => 0,
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 6,
            Severity::Critical => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    fn from_score(score: u32) -> Self {
        match score {
            0..=4 => ThreatLevel::Low,
            5..=11 => ThreatLevel::Medium,
            12..=23 => ThreatLevel::High,
            _ => ThreatLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    TemplateRegistered,
    TemplateUpdated,
    TemplateDeactivated,
    AuthenticationSucceeded,
    AuthenticationFailed,
    AccountLocked,
    LockedAttemptRejected,
    SpoofingDetected,
    TemplateCorrupt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub event_type: SecurityEventType,
    pub severity: Severity,
    pub identity: Option<Uuid>,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub threat_level_at_time: ThreatLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_events: usize,
    pub events_by_type: HashMap<SecurityEventType, usize>,
    pub spoofing_detected: usize,
    pub lockouts: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("Invalid event period")]
    InvalidPeriod,
}

/// Append-only record of security-relevant activity. Events are
/// observational: nothing here gates an authentication decision.
pub struct SecurityEventLog {
    events: RwLock<VecDeque<SecurityEvent>>,
    retention: Duration,
    threat_window: Duration,
}

impl SecurityEventLog {
    pub fn new(retention: Duration, threat_window: Duration) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            retention,
            threat_window,
        }
    }

    pub async fn record(
        &self,
        event_type: SecurityEventType,
        severity: Severity,
        identity: Option<Uuid>,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Uuid {
        let mut events = self.events.write().await;

        let threat_level_at_time = match identity {
            Some(id) => Self::threat_level_in(&events, id, now - self.threat_window, severity),
            None => ThreatLevel::from_score(severity.weight()),
        };

        let event = SecurityEvent {
            id: Uuid::new_v4(),
            event_type,
            severity,
            identity,
            data,
            timestamp: now,
            threat_level_at_time,
        };

        if severity >= Severity::High {
            warn!(event = ?event_type, ?severity, identity = ?identity, threat = ?threat_level_at_time, "Security event");
        } else {
            info!(event = ?event_type, ?severity, identity = ?identity, "Security event");
        }

        let id = event.id;
        events.push_back(event);

        // Cleanup old events
        let cutoff = now - self.retention;
        while events.front().map_or(false, |e| e.timestamp < cutoff) {
            events.pop_front();
        }

        id
    }

    fn threat_level_in(
        events: &VecDeque<SecurityEvent>,
        identity: Uuid,
        since: DateTime<Utc>,
        incoming: Severity,
    ) -> ThreatLevel {
        let score: u32 = events
            .iter()
            .filter(|e| e.identity == Some(identity) && e.timestamp >= since)
            .map(|e| e.severity.weight())
            .sum();
        ThreatLevel::from_score(score + incoming.weight())
    }

    pub async fn threat_level(&self, identity: Uuid, now: DateTime<Utc>) -> ThreatLevel {
        let events = self.events.read().await;
        Self::threat_level_in(&events, identity, now - self.threat_window, Severity::Info)
    }

    pub async fn events_for(&self, identity: Uuid) -> Vec<SecurityEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.identity == Some(identity))
            .cloned()
            .collect()
    }

    pub async fn get_events(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<SecurityEvent>, EventLogError> {
        if end_time < start_time {
            return Err(EventLogError::InvalidPeriod);
        }

        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.timestamp >= start_time && e.timestamp <= end_time)
            .cloned()
            .collect())
    }

    pub async fn get_summary(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<EventSummary, EventLogError> {
        let events = self.get_events(start_time, end_time).await?;
        let mut events_by_type = HashMap::new();
        for event in &events {
            *events_by_type.entry(event.event_type).or_insert(0) += 1;
        }

        Ok(EventSummary {
            period_start: start_time,
            period_end: end_time,
            total_events: events.len(),
            spoofing_detected: events_by_type.get(&SecurityEventType::SpoofingDetected).copied().unwrap_or(0),
            lockouts: events_by_type.get(&SecurityEventType::AccountLocked).copied().unwrap_or(0),
            events_by_type,
        })
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }
}
