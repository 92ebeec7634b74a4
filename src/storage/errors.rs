// src/storage/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Integrity check failed: {0}")]
    IntegrityError(String),

    #[error("Key derivation error: {0}")]
    KeyError(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
