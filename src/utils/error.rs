// src/utils/error.rs
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::errors::StorageError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid gesture sample: {0}")]
    InputShape(String),

    #[error("Degenerate vector: {0}")]
    DegenerateVector(String),

    #[error("Template corrupt: {0}")]
    TemplateCorrupt(String),

    #[error("Account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("Suspected spoofing: {0}")]
    SuspectedSpoofing(String),

    #[error("No active gesture template for identity {0}")]
    TemplateNotFound(Uuid),

    #[error("Identity {0} already has an active gesture template")]
    TemplateExists(Uuid),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for AuthError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::DecryptionError(msg) | StorageError::IntegrityError(msg) => {
                AuthError::TemplateCorrupt(msg)
            }
            other => AuthError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
