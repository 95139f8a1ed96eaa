mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub use dto::RecipeResponse;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
