use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::{AppConfig, StorageBackend};
use crate::database::{manager, MemoryStore, PgStore, Store};
use crate::services::{AccountService, ProjectService, TaskService};

/// Shared handles every request handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Open the configured backend. PostgreSQL gets its schema applied first.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = match config.database.backend {
            StorageBackend::Postgres => {
                let pool = manager::connect(&config.database).await?;
                manager::migrate(&pool).await?;
                Arc::new(PgStore::new(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let tokens = TokenService::from_config(&config.security)?;
        Ok(Self::new(store, tokens))
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.tokens.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.store.clone())
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.store.clone())
    }
}
