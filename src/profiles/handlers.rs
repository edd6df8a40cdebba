use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{Profile, ProfileResponse},
    services,
};
use crate::{auth::jwt::AuthUser, error::Result, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles/:username", get(get_profile))
        .route(
            "/profiles/:username/follow",
            post(follow_user).delete(unfollow_user),
        )
}

#[instrument(skip(state, identity))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let (user, following) = services::get_profile(&state, &identity, &username).await?;
    Ok(Json(ProfileResponse {
        profile: Profile::new(user, following),
    }))
}

#[instrument(skip(state, identity))]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let user = services::follow(&state, &identity, &username).await?;
    Ok(Json(ProfileResponse {
        profile: Profile::new(user, true),
    }))
}

#[instrument(skip(state, identity))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let user = services::unfollow(&state, &identity, &username).await?;
    Ok(Json(ProfileResponse {
        profile: Profile::new(user, false),
    }))
}
