use async_trait::async_trait;
use sqlx::PgPool;

use crate::store::StoreError;

/// Follow-edge partition of the store. Edges are directed
/// `follower_id -> followee_id`.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, follower_id: i64, followee_id: i64) -> Result<bool, StoreError>;
    /// Inserting an existing edge is a no-op.
    async fn create(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError>;
    /// Deleting a missing edge is a no-op.
    async fn delete(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgFollowRepository {
    db: PgPool,
}

impl PgFollowRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn exists(&self, follower_id: i64, followee_id: i64) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM follows
                 WHERE follower_id = $1 AND followee_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }

    async fn create(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
