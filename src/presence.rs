//! Presence cache: a per-user "online" marker with a time-to-live.
//! Entries are never deleted explicitly; readers ignore expired ones.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::store::StoreError;

#[async_trait]
pub trait PresenceCache: Send + Sync {
    /// Marks `user_id` online until `ttl` from now, replacing any earlier marker.
    async fn set_online(&self, user_id: i64, ttl: Duration) -> Result<(), StoreError>;
    async fn is_online(&self, user_id: i64) -> Result<bool, StoreError>;
}

/// Presence kept in `user_presence`, keyed by user id.
#[derive(Clone)]
pub struct PgPresence {
    db: PgPool,
}

impl PgPresence {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PresenceCache for PgPresence {
    async fn set_online(&self, user_id: i64, ttl: Duration) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_presence (user_id, expires_at)
            VALUES ($1, now() + make_interval(secs => $2))
            ON CONFLICT (user_id) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(user_id)
        .bind(ttl.as_secs_f64())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn is_online(&self, user_id: i64) -> Result<bool, StoreError> {
        let online: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_presence WHERE user_id = $1 AND expires_at > now())",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(online)
    }
}
