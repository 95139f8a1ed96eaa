use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::dto::{CreateRecipeRequest, RecipeResponse, UpdateRecipeRequest};
use super::repo;
use super::services::{delete_with_objects, is_valid_rating, with_image_url};
use crate::{auth::AuthUser, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", patch(update_recipe))
        .route("/recipes/:id", delete(delete_recipe))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<RecipeResponse>>, (StatusCode, String)> {
    let recipes = repo::list_all(&state.db).await.map_err(internal)?;
    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        items.push(with_image_url(&state, recipe).await);
    }
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, (StatusCode, String)> {
    let recipe = repo::get(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".to_string()))?;
    Ok(Json(with_image_url(&state, recipe).await))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }
    if !is_valid_rating(payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }

    let recipe = repo::create(
        &state.db,
        user_id,
        name,
        payload.description.as_deref(),
        payload.rating,
    )
    .await
    .map_err(internal)?;

    info!(recipe_id = %recipe.id, "recipe created");
    Ok((
        StatusCode::CREATED,
        Json(with_image_url(&state, recipe).await),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, (StatusCode, String)> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err((StatusCode::BAD_REQUEST, "Name must not be empty".into()));
        }
    }
    if !is_valid_rating(payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }

    let recipe = repo::update(
        &state.db,
        id,
        payload.name.as_deref().map(str::trim),
        payload.description.as_deref(),
        payload.rating,
    )
    .await
    .map_err(internal)?
    .ok_or((StatusCode::NOT_FOUND, "Recipe not found".to_string()))?;

    Ok(Json(with_image_url(&state, recipe).await))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = delete_with_objects(&state, id).await.map_err(|e| {
        error!(error = %e, %id, "delete recipe failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }
    info!(recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
