use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{AddHistoryRequest, RecentHistoryItem, RecentQuery, UpdateHistoryRequest};
use super::repo;
use crate::{
    auth::AuthUser,
    recipes::{self, services::with_image_url},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/:id/history", get(list_by_recipe))
        .route("/history/recent", get(list_recent))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/history", post(add_entry))
        .route("/history/:id", patch(update_entry))
        .route("/history/:id", delete(delete_entry))
}

#[instrument(skip(state))]
pub async fn list_by_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<Vec<repo::HistoryEntry>>, (StatusCode, String)> {
    let entries = repo::list_by_recipe(&state.db, recipe_id)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn list_recent(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<RecentHistoryItem>>, (StatusCode, String)> {
    let entries = repo::list_recent(&state.db, q.limit.clamp(1, 100))
        .await
        .map_err(internal)?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let recipe = recipes::repo::get(&state.db, entry.recipe_id)
            .await
            .map_err(internal)?;
        let recipe = match recipe {
            Some(r) => Some(with_image_url(&state, r).await),
            None => None,
        };
        items.push(RecentHistoryItem { entry, recipe });
    }
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddHistoryRequest>,
) -> Result<(StatusCode, Json<repo::HistoryEntry>), (StatusCode, String)> {
    if !recipes::services::is_valid_rating(payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }
    if recipes::repo::get(&state.db, payload.recipe_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }

    let cooked_at = payload.cooked_at.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = repo::insert(
        &state.db,
        user_id,
        payload.recipe_id,
        cooked_at,
        payload.notes.as_deref(),
        payload.rating,
    )
    .await
    .map_err(internal)?;

    recipes::repo::touch_last_cooked(&state.db, entry.recipe_id, entry.cooked_at)
        .await
        .map_err(internal)?;

    info!(entry_id = %entry.id, recipe_id = %entry.recipe_id, "history entry added");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHistoryRequest>,
) -> Result<Json<repo::HistoryEntry>, (StatusCode, String)> {
    if !recipes::services::is_valid_rating(payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }
    let entry = repo::update(&state.db, id, payload.notes.as_deref(), payload.rating)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "History entry not found".to_string()))?;
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "History entry not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
