pub mod core;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use tracing::info;

pub use crate::core::gesture::{GestureSample, Point3, TemplateSummary, Tolerance};
pub use crate::core::services::{AuthDecision, AuthenticationService, GestureInsights, Outcome};
pub use crate::utils::error::{AuthError, Result};

use crate::{
    storage::MemoryStore,
    utils::config::Config,
};

/// Wires the authentication service to an in-process document store.
pub struct Application {
    config: Arc<Config>,
    store: Arc<MemoryStore>,
    auth_service: Arc<AuthenticationService>,
}

impl Application {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        info!("Initializing storage...");
        let store = Arc::new(MemoryStore::new());

        info!("Initializing services...");
        let auth_service = Arc::new(AuthenticationService::new(
            &config,
            store.clone(),
            store.clone(),
        )?);

        Ok(Self {
            config,
            store,
            auth_service,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn auth_service(&self) -> Arc<AuthenticationService> {
        self.auth_service.clone()
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }
}
