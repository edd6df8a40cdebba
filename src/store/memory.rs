//! In-process store used by `STORE_BACKEND=memory` and the test suite.
//! Implements the user, follow and presence contracts over shared maps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::StoreError;
use crate::presence::PresenceCache;
use crate::profiles::repo::FollowRepository;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserUpdate};

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: HashMap<i64, User>,
}

impl UserTable {
    fn email_taken(&self, email: &str) -> bool {
        self.rows.values().any(|u| u.email == email)
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    follows: DashSet<(i64, i64)>,
    presence: DashMap<i64, Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.users.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.users.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.users.write().await;
        if table.email_taken(&user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if table.username_taken(&user.username, None) {
            return Err(StoreError::Duplicate("username"));
        }

        table.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: table.next_id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            bio: String::new(),
            image: String::new(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: &UserUpdate) -> Result<Option<User>, StoreError> {
        let mut table = self.users.write().await;
        if let Some(username) = &changes.username {
            if table.username_taken(username, Some(id)) {
                return Err(StoreError::Duplicate("username"));
            }
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            row.username = username.clone();
        }
        if let Some(bio) = &changes.bio {
            row.bio = bio.clone();
        }
        if let Some(image) = &changes.image {
            row.image = image.clone();
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn exists(&self, follower_id: i64, followee_id: i64) -> Result<bool, StoreError> {
        Ok(self.follows.contains(&(follower_id, followee_id)))
    }

    async fn create(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError> {
        if follower_id == followee_id {
            return Err(StoreError::Rejected("follower and followee must differ".into()));
        }
        self.follows.insert((follower_id, followee_id));
        Ok(())
    }

    async fn delete(&self, follower_id: i64, followee_id: i64) -> Result<(), StoreError> {
        self.follows.remove(&(follower_id, followee_id));
        Ok(())
    }
}

#[async_trait]
impl PresenceCache for MemoryStore {
    async fn set_online(&self, user_id: i64, ttl: Duration) -> Result<(), StoreError> {
        self.presence.insert(user_id, Instant::now() + ttl);
        Ok(())
    }

    async fn is_online(&self, user_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .presence
            .get(&user_id)
            .is_some_and(|expires_at| *expires_at > Instant::now()))
    }
}
