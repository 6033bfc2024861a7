use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod query;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::router()
}
