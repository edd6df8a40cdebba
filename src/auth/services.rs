use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::claims::Identity;
use super::password::{spawn_hash, spawn_verify};
use crate::{
    error::{AppError, Result},
    state::AppState,
    store::{within, StoreError},
    users::{NewUser, User, UserUpdate},
};

/// Same message for unknown email and wrong password.
const BAD_CREDENTIALS: &str = "email or password is wrong";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Verifies credentials, marks the user online and issues a session token.
#[instrument(skip(state, password))]
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, String)> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }

    let limit = state.store_timeout();
    let found = within(limit, "find_user_by_email", state.users.find_by_email(&email)).await?;

    // Both failure paths pay for one Argon2 verify.
    let stored = found.as_ref().map(|u| u.password_hash.clone());
    let matches = spawn_verify(password.to_string(), stored).await?;
    let user = match found {
        Some(user) if matches => user,
        Some(user) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::unauthorized(BAD_CREDENTIALS));
        }
        None => {
            warn!("login unknown email");
            return Err(AppError::unauthorized(BAD_CREDENTIALS));
        }
    };

    let ttl = state.config.presence_ttl();
    within(limit, "set_online", state.presence.set_online(user.id, ttl))
        .await
        .map_err(|e| AppError::internal(format!("mark user online: {e}")))?;

    let token = state.keys.issue(user.id, &user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok((user, token))
}

#[instrument(skip(state, password))]
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
    username: &str,
) -> Result<User> {
    let email = normalize_email(email);
    let username = username.trim();
    if email.is_empty() || password.is_empty() || username.is_empty() {
        return Err(AppError::bad_request(
            "email, password, and username are required",
        ));
    }
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(AppError::bad_request("invalid email"));
    }

    let limit = state.store_timeout();
    if within(limit, "find_user_by_email", state.users.find_by_email(&email))
        .await?
        .is_some()
    {
        warn!("email already registered");
        return Err(AppError::conflict("user already exists"));
    }

    let password_hash = spawn_hash(password.to_string()).await?;
    let new_user = NewUser {
        email,
        username: username.to_string(),
        password_hash,
    };

    // A concurrent registration can slip past the lookup above; the store's
    // unique constraint is the source of truth.
    let user = match within(limit, "create_user", state.users.create(new_user)).await {
        Ok(user) => user,
        Err(StoreError::Duplicate("email")) => {
            warn!("email claimed concurrently");
            return Err(AppError::conflict("user already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Loads the caller and hands back a freshly issued token.
#[instrument(skip(state))]
pub async fn current_user(state: &AppState, identity: &Identity) -> Result<(User, String)> {
    let user = within(
        state.store_timeout(),
        "find_user_by_id",
        state.users.find_by_id(identity.user_id),
    )
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))?;

    let token = state.keys.issue(user.id, &user.email)?;
    Ok((user, token))
}

#[instrument(skip(state))]
pub async fn update_user(
    state: &AppState,
    identity: &Identity,
    mut changes: UserUpdate,
) -> Result<User> {
    if let Some(username) = changes.username.as_mut() {
        *username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::bad_request("username must not be empty"));
        }
    }
    if changes.is_empty() {
        return Err(AppError::bad_request("no fields to update"));
    }

    let user = within(
        state.store_timeout(),
        "update_user",
        state.users.update(identity.user_id, &changes),
    )
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))?;

    info!(user_id = user.id, "user updated");
    Ok(user)
}
