use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledMeal {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub scheduled_for: OffsetDateTime,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

const MEAL_COLUMNS: &str = "id, recipe_id, scheduled_for, notes, completed, created_by, created_at";

pub async fn list(db: &PgPool, include_completed: bool) -> anyhow::Result<Vec<ScheduledMeal>> {
    let rows = sqlx::query_as::<_, ScheduledMeal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM scheduled_meals
        WHERE $1 OR NOT completed
        ORDER BY scheduled_for ASC
        "#
    ))
    .bind(include_completed)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_range(
    db: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> anyhow::Result<Vec<ScheduledMeal>> {
    let rows = sqlx::query_as::<_, ScheduledMeal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM scheduled_meals
        WHERE scheduled_for BETWEEN $1 AND $2
        ORDER BY scheduled_for ASC
        "#
    ))
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ScheduledMeal>> {
    let meal = sqlx::query_as::<_, ScheduledMeal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM scheduled_meals WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    scheduled_for: OffsetDateTime,
    notes: Option<&str>,
) -> anyhow::Result<ScheduledMeal> {
    let meal = sqlx::query_as::<_, ScheduledMeal>(&format!(
        r#"
        INSERT INTO scheduled_meals (recipe_id, scheduled_for, notes, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(recipe_id)
    .bind(scheduled_for)
    .bind(notes)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(meal)
}

/// Flip completed to true. Returns the row only when it was still pending,
/// so a repeated complete call cannot spawn a second history entry.
pub async fn mark_completed_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<ScheduledMeal>> {
    let meal = sqlx::query_as::<_, ScheduledMeal>(&format!(
        r#"
        UPDATE scheduled_meals
           SET completed = TRUE
         WHERE id = $1 AND NOT completed
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(meal)
}

/// Partial update: absent fields keep their current value.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    scheduled_for: Option<OffsetDateTime>,
    notes: Option<&str>,
) -> anyhow::Result<Option<ScheduledMeal>> {
    let meal = sqlx::query_as::<_, ScheduledMeal>(&format!(
        r#"
        UPDATE scheduled_meals
           SET scheduled_for = COALESCE($2, scheduled_for),
               notes = COALESCE($3, notes)
         WHERE id = $1
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(scheduled_for)
    .bind(notes)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM scheduled_meals WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
