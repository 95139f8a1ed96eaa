use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<i16>,
    pub image_key: Option<String>,
    pub image_status: Option<String>,
    pub image_source: Option<String>,
    pub image_prompt: Option<String>,
    pub last_cooked_at: Option<OffsetDateTime>,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const RECIPE_COLUMNS: &str = r#"
    id, name, description, rating, image_key, image_status, image_source,
    image_prompt, last_cooked_at, created_by, created_at, updated_at
"#;

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    rating: Option<i16>,
) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (name, description, rating, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(description)
    .bind(rating)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(recipe)
}

/// Partial update: absent fields keep their current value.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    rating: Option<i16>,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        UPDATE recipes
           SET name = COALESCE($2, name),
               description = COALESCE($3, description),
               rating = COALESCE($4, rating),
               updated_at = now()
         WHERE id = $1
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(rating)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

/// Delete a recipe row. History, schedule and image rows go with it via
/// ON DELETE CASCADE; returns whether a row was removed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All object-storage keys referenced by a recipe and its image variants.
pub async fn collect_image_keys(db: &PgPool, id: Uuid) -> anyhow::Result<Vec<String>> {
    let mut keys: Vec<String> = sqlx::query_scalar(
        "SELECT image_key FROM recipe_images WHERE recipe_id = $1 AND image_key IS NOT NULL",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let recipe_key: Option<String> =
        sqlx::query_scalar("SELECT image_key FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .flatten();
    if let Some(k) = recipe_key {
        if !keys.contains(&k) {
            keys.push(k);
        }
    }
    Ok(keys)
}

/// Move last_cooked_at forward; never backwards.
pub async fn touch_last_cooked(
    db: &PgPool,
    id: Uuid,
    cooked_at: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE recipes
           SET last_cooked_at = GREATEST(COALESCE(last_cooked_at, $2), $2)
         WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(cooked_at)
    .execute(db)
    .await?;
    Ok(())
}
