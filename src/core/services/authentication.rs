// src/core/services/authentication.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn, error};
use uuid::Uuid;

use super::insights::{self, GestureInsights};
use super::locks::IdentityLocks;
use crate::{
    core::{
        gesture::{
            complexity,
            matcher::GestureMatcher,
            types::{GestureSample, GestureTemplate, TemplateSummary, Tolerance, UsageStats},
        },
        security::{
            anti_spoofing::AntiSpoofingAnalyzer,
            events::{SecurityEventLog, SecurityEventType, Severity},
            lockout::{LockStatus, LockoutPolicy, LockoutState},
        },
    },
    storage::{cipher::TemplateCipher, LockoutStore, TemplateStore},
    utils::{
        config::Config,
        error::{AuthError, Result},
    },
};

/// Source of the current time, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthDecision {
    pub outcome: Outcome,
    pub confidence: f64,
    /// Only reported for denied attempts.
    pub attempts_remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockoutView {
    pub locked_until: Option<DateTime<Utc>>,
    pub attempts_remaining: u32,
    pub last_login: Option<DateTime<Utc>>,
}

pub struct AuthenticationService {
    templates: Arc<dyn TemplateStore>,
    lockouts: Arc<dyn LockoutStore>,
    cipher: Arc<TemplateCipher>,
    matcher: GestureMatcher,
    analyzer: AntiSpoofingAnalyzer,
    lockout_policy: LockoutPolicy,
    default_tolerance: Tolerance,
    events: Arc<SecurityEventLog>,
    locks: IdentityLocks,
    clock: Arc<dyn Clock>,
}

impl AuthenticationService {
    pub fn new(
        config: &Config,
        templates: Arc<dyn TemplateStore>,
        lockouts: Arc<dyn LockoutStore>,
    ) -> Result<Self> {
        Self::with_clock(config, templates, lockouts, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &Config,
        templates: Arc<dyn TemplateStore>,
        lockouts: Arc<dyn LockoutStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let cipher = Arc::new(TemplateCipher::new(
            config.storage.encryption_secret.as_bytes(),
            config.storage.kdf_iterations,
        )?);
        let default_tolerance = Tolerance::new(
            config.matching.position_tolerance,
            config.matching.timing_tolerance,
        )?;

        Ok(Self {
            templates,
            lockouts,
            matcher: GestureMatcher::new(cipher.clone()),
            cipher,
            analyzer: AntiSpoofingAnalyzer::new(config.anti_spoofing.clone()),
            lockout_policy: LockoutPolicy::new(config.lockout.max_attempts, config.get_lock_duration()?),
            default_tolerance,
            events: Arc::new(SecurityEventLog::new(
                config.get_event_retention(),
                config.get_threat_window(),
            )),
            locks: IdentityLocks::new(),
            clock,
        })
    }

    pub fn events(&self) -> Arc<SecurityEventLog> {
        self.events.clone()
    }

    async fn active_template(&self, identity: Uuid) -> Result<Option<GestureTemplate>> {
        Ok(self
            .templates
            .load(identity)
            .await?
            .filter(|template| template.active))
    }

    pub async fn register_template(
        &self,
        identity: Uuid,
        sample: GestureSample,
    ) -> Result<TemplateSummary> {
        sample.validate()?;
        let _guard = self.locks.acquire(identity).await;

        if self.active_template(identity).await?.is_some() {
            warn!("Identity {} already has an active template", identity);
            return Err(AuthError::TemplateExists(identity));
        }

        let report = complexity::score(&sample);
        let now = self.clock.now();
        let template = GestureTemplate {
            id: Uuid::new_v4(),
            identity,
            sample: self.cipher.seal(&sample)?,
            complexity: report.complexity,
            biometric_profile: report.biometric_profile,
            tolerance: self.default_tolerance,
            usage_stats: UsageStats::default(),
            active: true,
            created_at: now,
            updated_at: now,
            deactivated_at: None,
        };

        self.templates.save(identity, &template).await?;
        self.events
            .record(
                SecurityEventType::TemplateRegistered,
                Severity::Info,
                Some(identity),
                json!({ "template_id": template.id, "complexity": template.complexity }),
                now,
            )
            .await;

        info!("Registered gesture template {} for identity {}", template.id, identity);
        Ok(template.summary())
    }

    /// Login decision for one live attempt. Wrong gestures are a `Denied`
    /// decision; locked accounts, suspected spoofing and malformed input are
    /// errors and leave the lockout counters untouched.
    pub async fn validate_live(
        &self,
        identity: Uuid,
        sample: GestureSample,
    ) -> Result<AuthDecision> {
        sample.validate()?;
        let _guard = self.locks.acquire(identity).await;
        let now = self.clock.now();

        let mut lockout = self.lockouts.load_lockout(identity).await?;
        if let LockStatus::Locked { until } = self.lockout_policy.status(&lockout, now) {
            self.events
                .record(
                    SecurityEventType::LockedAttemptRejected,
                    Severity::Medium,
                    Some(identity),
                    json!({ "locked_until": until }),
                    now,
                )
                .await;
            return Err(AuthError::AccountLocked { until });
        }

        let report = self.analyzer.analyze(&sample);
        if !report.passed() {
            let reasons = report.reasons();
            self.events
                .record(
                    SecurityEventType::SpoofingDetected,
                    report.max_severity().unwrap_or(Severity::High),
                    Some(identity),
                    json!({ "checks": report.checks }),
                    now,
                )
                .await;
            return Err(AuthError::SuspectedSpoofing(reasons.join(", ")));
        }

        let mut template = self
            .active_template(identity)
            .await?
            .ok_or(AuthError::TemplateNotFound(identity))?;

        let outcome = match self.matcher.validate(&mut template, &sample, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Template {} for identity {} is unreadable: {}", template.id, identity, e);
                self.events
                    .record(
                        SecurityEventType::TemplateCorrupt,
                        Severity::Critical,
                        Some(identity),
                        json!({ "template_id": template.id }),
                        now,
                    )
                    .await;
                return Err(e);
            }
        };
        template.updated_at = now;

        let mut tripped_lock = None;
        let decision = if outcome.success {
            self.lockout_policy.record_success(&mut lockout, now);
            AuthDecision {
                outcome: Outcome::Granted,
                confidence: outcome.confidence,
                attempts_remaining: None,
            }
        } else {
            let failure = self.lockout_policy.record_failure(&mut lockout, now)?;
            tripped_lock = failure.locked_until.map(|until| (until, failure.attempts));
            AuthDecision {
                outcome: Outcome::Denied,
                confidence: outcome.confidence,
                attempts_remaining: Some(failure.attempts_remaining),
            }
        };

        // No shared transaction: lockout state is persisted before usage stats.
        self.lockouts.save_lockout(identity, &lockout).await?;
        self.templates.save(identity, &template).await?;

        if let Some((until, attempts)) = tripped_lock {
            warn!("Identity {} locked until {} after {} failures", identity, until, attempts);
            self.events
                .record(
                    SecurityEventType::AccountLocked,
                    Severity::High,
                    Some(identity),
                    json!({ "locked_until": until, "attempts": attempts }),
                    now,
                )
                .await;
        }

        let (event_type, severity) = match decision.outcome {
            Outcome::Granted => (SecurityEventType::AuthenticationSucceeded, Severity::Info),
            Outcome::Denied => (SecurityEventType::AuthenticationFailed, Severity::Low),
        };
        self.events
            .record(
                event_type,
                severity,
                Some(identity),
                json!({ "confidence": decision.confidence }),
                now,
            )
            .await;

        info!(
            identity = %identity,
            outcome = ?decision.outcome,
            confidence = decision.confidence,
            "Gesture authentication attempt"
        );
        Ok(decision)
    }

    /// Replaces the stored sample and recomputes its derived descriptors.
    /// Usage history and tolerance carry over.
    pub async fn update_template(
        &self,
        identity: Uuid,
        sample: GestureSample,
    ) -> Result<TemplateSummary> {
        sample.validate()?;
        let _guard = self.locks.acquire(identity).await;

        let mut template = self
            .active_template(identity)
            .await?
            .ok_or(AuthError::TemplateNotFound(identity))?;

        let report = complexity::score(&sample);
        let now = self.clock.now();
        template.sample = self.cipher.seal(&sample)?;
        template.complexity = report.complexity;
        template.biometric_profile = report.biometric_profile;
        template.updated_at = now;

        self.templates.save(identity, &template).await?;
        self.events
            .record(
                SecurityEventType::TemplateUpdated,
                Severity::Info,
                Some(identity),
                json!({ "template_id": template.id, "complexity": template.complexity }),
                now,
            )
            .await;

        info!("Updated gesture template {} for identity {}", template.id, identity);
        Ok(template.summary())
    }

    pub async fn update_tolerance(
        &self,
        identity: Uuid,
        tolerance: Tolerance,
    ) -> Result<TemplateSummary> {
        let tolerance = Tolerance::new(tolerance.position, tolerance.timing)?;
        let _guard = self.locks.acquire(identity).await;

        let mut template = self
            .active_template(identity)
            .await?
            .ok_or(AuthError::TemplateNotFound(identity))?;
        template.tolerance = tolerance;
        template.updated_at = self.clock.now();

        self.templates.save(identity, &template).await?;
        Ok(template.summary())
    }

    /// Soft delete: the document stays, flagged inactive.
    pub async fn deactivate_template(&self, identity: Uuid) -> Result<()> {
        let _guard = self.locks.acquire(identity).await;

        let mut template = self
            .active_template(identity)
            .await?
            .ok_or(AuthError::TemplateNotFound(identity))?;

        let now = self.clock.now();
        template.deactivate(now);
        self.templates.save(identity, &template).await?;
        self.events
            .record(
                SecurityEventType::TemplateDeactivated,
                Severity::Info,
                Some(identity),
                json!({ "template_id": template.id }),
                now,
            )
            .await;

        info!("Deactivated gesture template {} for identity {}", template.id, identity);
        Ok(())
    }

    pub async fn template_summary(&self, identity: Uuid) -> Result<TemplateSummary> {
        self.active_template(identity)
            .await?
            .map(|template| template.summary())
            .ok_or(AuthError::TemplateNotFound(identity))
    }

    pub async fn lockout_status(&self, identity: Uuid) -> Result<LockoutView> {
        let state: LockoutState = self.lockouts.load_lockout(identity).await?;
        let locked_until = match self.lockout_policy.status(&state, self.clock.now()) {
            LockStatus::Locked { until } => Some(until),
            LockStatus::Unlocked => None,
        };

        Ok(LockoutView {
            locked_until,
            attempts_remaining: self.lockout_policy.attempts_remaining(&state),
            last_login: state.last_login,
        })
    }

    /// Scores a candidate gesture without touching any identity.
    pub fn analyze_for_insights(&self, sample: &GestureSample) -> Result<GestureInsights> {
        sample.validate()?;
        let spoofing = self.analyzer.analyze(sample);
        Ok(insights::analyze(sample, &spoofing))
    }
}
