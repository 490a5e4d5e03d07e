//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{BlobStorage, Cache, Database};
use crate::jobs::Notifier;
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Redis cache (user snapshots, product detail, rate limits)
    pub cache: Arc<Cache>,
    pub database: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the production service graph over the database connection.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        config: Config,
        notifier: Arc<dyn Notifier>,
        storage: Option<Arc<dyn BlobStorage>>,
    ) -> Self {
        let services = Arc::new(Services::from_connection(
            database.get_connection(),
            config.clone(),
            notifier,
            storage,
            cache.clone(),
        ));
        Self::new(services, cache, database, config)
    }

    /// Create state with an injected service container.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        cache: Arc<Cache>,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self {
            services,
            cache,
            database,
            config: Arc::new(config),
        }
    }
}
