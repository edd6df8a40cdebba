use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UpdateUserRequest, UserBody, UserEnvelope, UserResponse},
        jwt::AuthUser,
        services,
    },
    error::Result,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_current_user).put(update_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserEnvelope<RegisterRequest>>,
) -> Result<Json<UserResponse>> {
    let RegisterRequest {
        email,
        password,
        username,
    } = payload.user;
    let user = services::register(&state, &email, &password, &username).await?;
    Ok(Json(UserEnvelope {
        user: UserBody::new(user, None),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserEnvelope<LoginRequest>>,
) -> Result<Json<UserResponse>> {
    let LoginRequest { email, password } = payload.user;
    let (user, token) = services::login(&state, &email, &password).await?;
    Ok(Json(UserEnvelope {
        user: UserBody::new(user, Some(token)),
    }))
}

#[instrument(skip(state, identity))]
pub async fn get_current_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserResponse>> {
    let (user, token) = services::current_user(&state, &identity).await?;
    Ok(Json(UserEnvelope {
        user: UserBody::new(user, Some(token)),
    }))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<UserEnvelope<UpdateUserRequest>>,
) -> Result<Json<UserResponse>> {
    let user = services::update_user(&state, &identity, payload.user.into()).await?;
    Ok(Json(UserEnvelope {
        user: UserBody::new(user, None),
    }))
}
