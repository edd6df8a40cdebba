use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, StoreBackend};
use crate::presence::{PgPresence, PresenceCache};
use crate::profiles::{FollowRepository, PgFollowRepository};
use crate::store::memory::MemoryStore;
use crate::users::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub presence: Arc<dyn PresenceCache>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let db = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(config.store_timeout())
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;

                tracing::info!("using postgres store");
                Ok(Self::from_parts(
                    config,
                    Arc::new(PgUserRepository::new(db.clone())),
                    Arc::new(PgFollowRepository::new(db.clone())),
                    Arc::new(PgPresence::new(db)),
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::from_parts(config, store.clone(), store.clone(), store))
            }
        }
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        presence: Arc<dyn PresenceCache>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            config,
            keys,
            users,
            follows,
            presence,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        self.config.store_timeout()
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            store.clone(),
            store.clone(),
            store,
        )
    }
}
