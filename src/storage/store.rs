// src/storage/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::errors::*;
use crate::core::gesture::types::GestureTemplate;
use crate::core::security::lockout::LockoutState;

/// Persistence hook for gesture templates. Implementations must make `save`
/// atomic for a single document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn load(&self, identity: Uuid) -> Result<Option<GestureTemplate>>;
    async fn save(&self, identity: Uuid, template: &GestureTemplate) -> Result<()>;
}

/// Persistence hook for the lockout fields of an identity record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockoutStore: Send + Sync {
    /// Identities never seen before start from a clean state.
    async fn load_lockout(&self, identity: Uuid) -> Result<LockoutState>;
    async fn save_lockout(&self, identity: Uuid, state: &LockoutState) -> Result<()>;
}

/// Document store kept in process memory. Values are held serialized so
/// every load hands out an independent copy, as a remote store would.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_vec(value)
            .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
        self.documents.write().insert(key.to_string(), serialized);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let documents = self.documents.read();
        let raw = match documents.get(key) {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let value = serde_json::from_slice(raw)
            .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
        Ok(Some(value))
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn template_key(identity: Uuid) -> String {
        format!("template:{}", identity)
    }

    fn lockout_key(identity: Uuid) -> String {
        format!("lockout:{}", identity)
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn load(&self, identity: Uuid) -> Result<Option<GestureTemplate>> {
        self.get(&Self::template_key(identity))
    }

    async fn save(&self, identity: Uuid, template: &GestureTemplate) -> Result<()> {
        self.put(&Self::template_key(identity), template)
    }
}

#[async_trait]
impl LockoutStore for MemoryStore {
    async fn load_lockout(&self, identity: Uuid) -> Result<LockoutState> {
        Ok(self.get(&Self::lockout_key(identity))?.unwrap_or_default())
    }

    async fn save_lockout(&self, identity: Uuid, state: &LockoutState) -> Result<()> {
        self.put(&Self::lockout_key(identity), state)
    }
}
