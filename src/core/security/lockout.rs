// src/core/security/lockout.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AuthError, Result};

/// Lockout fields persisted on the identity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutState {
    pub login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    Locked { until: DateTime<Utc> },
}

/// What a recorded failure did to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub attempts: u32,
    pub attempts_remaining: u32,
    /// Set when this failure tripped the lock.
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lock_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
        Self {
            max_attempts,
            lock_duration,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn status(&self, state: &LockoutState, now: DateTime<Utc>) -> LockStatus {
        match state.lock_until {
            Some(until) if until > now => LockStatus::Locked { until },
            _ => LockStatus::Unlocked,
        }
    }

    pub fn attempts_remaining(&self, state: &LockoutState) -> u32 {
        self.max_attempts.saturating_sub(state.login_attempts)
    }

    pub fn record_failure(&self, state: &mut LockoutState, now: DateTime<Utc>) -> Result<FailureOutcome> {
        let lock_expired = matches!(state.lock_until, Some(until) if until <= now);

        let locked_until = if lock_expired {
            // A stale lock restarts the count rather than re-locking at once.
            state.login_attempts = 1;
            state.lock_until = None;
            None
        } else {
            state.login_attempts = state.login_attempts.saturating_add(1);
            if state.login_attempts >= self.max_attempts && state.lock_until.is_none() {
                let until = now.checked_add_signed(self.lock_duration).ok_or_else(|| {
                    AuthError::Config(format!("lock expiry {} after {} is out of range", self.lock_duration, now))
                })?;
                state.lock_until = Some(until);
                Some(until)
            } else {
                None
            }
        };

        Ok(FailureOutcome {
            attempts: state.login_attempts,
            attempts_remaining: self.attempts_remaining(state),
            locked_until,
        })
    }

    pub fn record_success(&self, state: &mut LockoutState, now: DateTime<Utc>) {
        state.login_attempts = 0;
        state.lock_until = None;
        state.last_login = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(5, Duration::hours(2))
    }

    #[test]
    fn test_locks_on_fifth_failure() {
        let policy = policy();
        let mut state = LockoutState::default();
        let now = Utc::now();

        for expected_remaining in [4, 3, 2, 1] {
            let outcome = policy.record_failure(&mut state, now).unwrap();
            assert_eq!(outcome.attempts_remaining, expected_remaining);
            assert!(outcome.locked_until.is_none());
            assert_eq!(policy.status(&state, now), LockStatus::Unlocked);
        }

        let outcome = policy.record_failure(&mut state, now).unwrap();
        assert_eq!(outcome.attempts, 5);
        assert_eq!(outcome.attempts_remaining, 0);
        assert_eq!(outcome.locked_until, Some(now + Duration::hours(2)));
        assert_eq!(
            policy.status(&state, now + Duration::minutes(119)),
            LockStatus::Locked { until: now + Duration::hours(2) }
        );
    }

    #[test]
    fn test_expired_lock_restarts_count() {
        let policy = policy();
        let mut state = LockoutState::default();
        let start = Utc::now();

        for _ in 0..5 {
            policy.record_failure(&mut state, start).unwrap();
        }

        let later = start + Duration::hours(2);
        assert_eq!(policy.status(&state, later), LockStatus::Unlocked);

        let outcome = policy.record_failure(&mut state, later).unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.locked_until.is_none());
        assert_eq!(state.lock_until, None);
        assert_eq!(policy.status(&state, later), LockStatus::Unlocked);
    }

    #[test]
    fn test_success_resets_everything() {
        let policy = policy();
        let mut state = LockoutState::default();
        let now = Utc::now();

        for _ in 0..3 {
            policy.record_failure(&mut state, now).unwrap();
        }
        policy.record_success(&mut state, now);

        assert_eq!(state.login_attempts, 0);
        assert_eq!(state.lock_until, None);
        assert_eq!(state.last_login, Some(now));
        assert_eq!(policy.attempts_remaining(&state), 5);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = LockoutPolicy::new(2, Duration::seconds(1));
        let mut state = LockoutState::default();
        let now = Utc::now();

        policy.record_failure(&mut state, now).unwrap();
        let outcome = policy.record_failure(&mut state, now).unwrap();
        assert_eq!(outcome.locked_until, Some(now + Duration::seconds(1)));
        assert_eq!(policy.status(&state, now + Duration::milliseconds(1_001)), LockStatus::Unlocked);
    }

    #[test]
    fn test_lock_expiry_past_calendar_range_is_an_error() {
        let policy = LockoutPolicy::new(1, Duration::days(365));
        let mut state = LockoutState::default();
        let near_end = DateTime::<Utc>::MAX_UTC - Duration::days(1);

        assert!(matches!(policy.record_failure(&mut state, near_end), Err(AuthError::Config(_))));
        assert_eq!(state.lock_until, None);
    }
}
