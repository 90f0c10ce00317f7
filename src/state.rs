use std::sync::Arc;

use crate::auth::jwt::TokenService;
use crate::config::{AppConfig, StorageBackend};
use crate::store::{CredentialStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn CredentialStore> = match &config.storage {
            StorageBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let pg = PgStore::connect(database_url, *max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg)
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn CredentialStore>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            tokens: TokenService::new(&config.jwt),
            config,
        }
    }

    /// State over a fresh `MemoryStore`; the store handle is returned too so
    /// tests can reach past the API.
    #[cfg(test)]
    pub fn fake() -> (Self, Arc<MemoryStore>) {
        let config = Arc::new(AppConfig {
            storage: StorageBackend::Memory,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                ttl_minutes: None,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        let store = Arc::new(MemoryStore::new());
        (Self::from_parts(store.clone(), config), store)
    }
}
