use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CompleteRequest, ListQuery, RangeQuery, ScheduleRequest, ScheduledMealItem,
    UpdateScheduleRequest,
};
use super::repo::{self, ScheduledMeal};
use crate::{
    auth::AuthUser,
    recipes::{self, services::with_image_url},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/schedule", get(list_meals))
        .route("/schedule/range", get(list_range))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/schedule", post(schedule_meal))
        .route("/schedule/:id/complete", post(complete_meal))
        .route("/schedule/:id", patch(update_meal))
        .route("/schedule/:id", delete(delete_meal))
}

async fn join_recipes(
    state: &AppState,
    meals: Vec<ScheduledMeal>,
) -> anyhow::Result<Vec<ScheduledMealItem>> {
    let mut items = Vec::with_capacity(meals.len());
    for meal in meals {
        let recipe = recipes::repo::get(&state.db, meal.recipe_id).await?;
        let recipe = match recipe {
            Some(r) => Some(with_image_url(state, r).await),
            None => None,
        };
        items.push(ScheduledMealItem { meal, recipe });
    }
    Ok(items)
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ScheduledMealItem>>, (StatusCode, String)> {
    let meals = repo::list(&state.db, q.include_completed)
        .await
        .map_err(internal)?;
    Ok(Json(join_recipes(&state, meals).await.map_err(internal)?))
}

#[instrument(skip(state))]
pub async fn list_range(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<ScheduledMealItem>>, (StatusCode, String)> {
    if q.end < q.start {
        return Err((StatusCode::BAD_REQUEST, "end must not precede start".into()));
    }
    let meals = repo::list_by_range(&state.db, q.start, q.end)
        .await
        .map_err(internal)?;
    Ok(Json(join_recipes(&state, meals).await.map_err(internal)?))
}

#[instrument(skip(state, payload))]
pub async fn schedule_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduledMeal>), (StatusCode, String)> {
    if recipes::repo::get(&state.db, payload.recipe_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }

    let meal = repo::insert(
        &state.db,
        user_id,
        payload.recipe_id,
        payload.scheduled_for,
        payload.notes.as_deref(),
    )
    .await
    .map_err(internal)?;

    info!(meal_id = %meal.id, recipe_id = %meal.recipe_id, "meal scheduled");
    Ok((StatusCode::CREATED, Json(meal)))
}

/// Mark a planned meal as cooked. When `add_to_history` is set the meal
/// spawns exactly one history entry; completing an already-completed meal is
/// a no-op and never adds another.
#[instrument(skip(state, payload))]
pub async fn complete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<ScheduledMeal>, (StatusCode, String)> {
    if !recipes::services::is_valid_rating(payload.history_rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".into(),
        ));
    }

    let result = complete_in_tx(&state, user_id, id, &payload)
        .await
        .map_err(internal)?;
    match result {
        Some(meal) => Ok(Json(meal)),
        None => {
            // Not pending: either already completed or unknown.
            let meal = repo::get(&state.db, id)
                .await
                .map_err(internal)?
                .ok_or((StatusCode::NOT_FOUND, "Scheduled meal not found".to_string()))?;
            Ok(Json(meal))
        }
    }
}

async fn complete_in_tx(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    payload: &CompleteRequest,
) -> anyhow::Result<Option<ScheduledMeal>> {
    let mut tx = state.db.begin().await.context("begin tx")?;
    let Some(meal) = repo::mark_completed_tx(&mut tx, id).await? else {
        tx.rollback().await.ok();
        return Ok(None);
    };

    if payload.add_to_history {
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO cooking_history (recipe_id, cooked_at, notes, rating, cooked_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(meal.recipe_id)
        .bind(now)
        .bind(payload.history_notes.as_deref())
        .bind(payload.history_rating)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("insert history entry")?;

        sqlx::query(
            r#"
            UPDATE recipes
               SET last_cooked_at = GREATEST(COALESCE(last_cooked_at, $2), $2)
             WHERE id = $1
            "#,
        )
        .bind(meal.recipe_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("touch last_cooked_at")?;
    }

    tx.commit().await.context("commit tx")?;
    info!(meal_id = %meal.id, add_to_history = payload.add_to_history, "meal completed");
    Ok(Some(meal))
}

#[instrument(skip(state, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduledMeal>, (StatusCode, String)> {
    let meal = repo::update(&state.db, id, payload.scheduled_for, payload.notes.as_deref())
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Scheduled meal not found".to_string()))?;
    Ok(Json(meal))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Scheduled meal not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
