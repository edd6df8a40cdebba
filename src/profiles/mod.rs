use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub use repo::{FollowRepository, PgFollowRepository};

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
