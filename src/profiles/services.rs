//! Social graph: directed follow edges between users, resolved by username.

use tracing::{debug, info, instrument};

use crate::{
    auth::claims::Identity,
    error::{AppError, Result},
    state::AppState,
    store::within,
    users::User,
};

pub async fn is_following(state: &AppState, follower_id: i64, followee_id: i64) -> Result<bool> {
    let found = within(
        state.store_timeout(),
        "follow_exists",
        state.follows.exists(follower_id, followee_id),
    )
    .await?;
    Ok(found)
}

async fn resolve_username(state: &AppState, username: &str) -> Result<User> {
    within(
        state.store_timeout(),
        "find_user_by_username",
        state.users.find_by_username(username),
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("user `{username}` not found")))
}

/// Target profile plus whether the requester follows it.
#[instrument(skip(state))]
pub async fn get_profile(
    state: &AppState,
    requester: &Identity,
    username: &str,
) -> Result<(User, bool)> {
    let target = resolve_username(state, username).await?;
    let following = is_following(state, requester.user_id, target.id).await?;
    Ok((target, following))
}

/// Creates the edge `requester -> username`. Following twice is a no-op.
#[instrument(skip(state))]
pub async fn follow(state: &AppState, requester: &Identity, username: &str) -> Result<User> {
    let target = resolve_username(state, username).await?;
    if target.id == requester.user_id {
        return Err(AppError::conflict("cannot follow yourself"));
    }

    if is_following(state, requester.user_id, target.id).await? {
        debug!(follower = requester.user_id, followee = target.id, "already following");
        return Ok(target);
    }

    within(
        state.store_timeout(),
        "create_follow_edge",
        state.follows.create(requester.user_id, target.id),
    )
    .await?;
    info!(follower = requester.user_id, followee = target.id, "followed");
    Ok(target)
}

/// Removes the edge `requester -> username`. Unfollowing twice is a no-op.
#[instrument(skip(state))]
pub async fn unfollow(state: &AppState, requester: &Identity, username: &str) -> Result<User> {
    let target = resolve_username(state, username).await?;
    if target.id == requester.user_id {
        return Err(AppError::conflict("cannot unfollow yourself"));
    }

    if !is_following(state, requester.user_id, target.id).await? {
        debug!(follower = requester.user_id, followee = target.id, "not following");
        return Ok(target);
    }

    within(
        state.store_timeout(),
        "delete_follow_edge",
        state.follows.delete(requester.user_id, target.id),
    )
    .await?;
    info!(follower = requester.user_id, followee = target.id, "unfollowed");
    Ok(target)
}
