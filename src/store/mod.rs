//! Shared plumbing for the store adapters: the adapter error type and the
//! per-call deadline.

use std::{future::Future, time::Duration};

use tracing::warn;

pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the column name.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// The store refused the write for another constraint (e.g. a check).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("store call `{0}` timed out")]
    Timeout(&'static str),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_email_key") => "email",
                    Some("users_username_key") => "username",
                    Some("follows_pkey") => "follow",
                    _ => "record",
                };
                return StoreError::Duplicate(field);
            }
            if db_err.is_check_violation() {
                return StoreError::Rejected(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Runs one store call under `limit`. Elapsed deadlines surface as
/// [`StoreError::Timeout`] naming the operation.
pub async fn within<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => {
            warn!(op, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(StoreError::Timeout(op))
        }
    }
}
