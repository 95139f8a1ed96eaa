use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::repo::{self, OpenRouterModel};
use crate::{auth::AuthUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/models", get(list_models))
}

#[instrument(skip(state))]
pub async fn list_models(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<OpenRouterModel>>, (StatusCode, String)> {
    let models = repo::list(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(models))
}
