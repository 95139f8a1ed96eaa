use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub cooked_at: OffsetDateTime,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    pub cooked_by: Uuid,
    pub created_at: OffsetDateTime,
}

const HISTORY_COLUMNS: &str = "id, recipe_id, cooked_at, notes, rating, cooked_by, created_at";

pub async fn list_by_recipe(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<HistoryEntry>> {
    let rows = sqlx::query_as::<_, HistoryEntry>(&format!(
        r#"
        SELECT {HISTORY_COLUMNS}
        FROM cooking_history
        WHERE recipe_id = $1
        ORDER BY cooked_at DESC
        "#
    ))
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<HistoryEntry>> {
    let rows = sqlx::query_as::<_, HistoryEntry>(&format!(
        r#"
        SELECT {HISTORY_COLUMNS}
        FROM cooking_history
        ORDER BY cooked_at DESC
        LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    cooked_at: OffsetDateTime,
    notes: Option<&str>,
    rating: Option<i16>,
) -> anyhow::Result<HistoryEntry> {
    let entry = sqlx::query_as::<_, HistoryEntry>(&format!(
        r#"
        INSERT INTO cooking_history (recipe_id, cooked_at, notes, rating, cooked_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {HISTORY_COLUMNS}
        "#
    ))
    .bind(recipe_id)
    .bind(cooked_at)
    .bind(notes)
    .bind(rating)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(entry)
}

/// Partial update: absent fields keep their current value.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    notes: Option<&str>,
    rating: Option<i16>,
) -> anyhow::Result<Option<HistoryEntry>> {
    let entry = sqlx::query_as::<_, HistoryEntry>(&format!(
        r#"
        UPDATE cooking_history
           SET notes = COALESCE($2, notes),
               rating = COALESCE($3, rating)
         WHERE id = $1
        RETURNING {HISTORY_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(notes)
    .bind(rating)
    .fetch_optional(db)
    .await?;
    Ok(entry)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM cooking_history WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
