use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub mod status {
    pub const GENERATING: &str = "generating";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

pub mod source {
    pub const UPLOAD: &str = "upload";
    pub const AI: &str = "ai";
}

/// One image variant of a recipe; at most one per recipe is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeImage {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub image_key: Option<String>,
    pub prompt: String,
    pub status: String,
    pub is_accepted: bool,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

const IMAGE_COLUMNS: &str =
    "id, recipe_id, image_key, prompt, status, is_accepted, created_by, created_at";

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<RecipeImage>> {
    let row = sqlx::query_as::<_, RecipeImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM recipe_images WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_by_recipe(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<RecipeImage>> {
    let rows = sqlx::query_as::<_, RecipeImage>(&format!(
        r#"
        SELECT {IMAGE_COLUMNS}
        FROM recipe_images
        WHERE recipe_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_generating(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    prompt: &str,
) -> anyhow::Result<RecipeImage> {
    let row = sqlx::query_as::<_, RecipeImage>(&format!(
        r#"
        INSERT INTO recipe_images (recipe_id, prompt, status, created_by)
        VALUES ($1, $2, '{generating}', $3)
        RETURNING {IMAGE_COLUMNS}
        "#,
        generating = status::GENERATING,
    ))
    .bind(recipe_id)
    .bind(prompt)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn insert_completed_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    recipe_id: Uuid,
    image_key: &str,
    prompt: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(&format!(
        r#"
        INSERT INTO recipe_images (recipe_id, image_key, prompt, status, created_by)
        VALUES ($1, $2, $3, '{completed}', $4)
        RETURNING id
        "#,
        completed = status::COMPLETED,
    ))
    .bind(recipe_id)
    .bind(image_key)
    .bind(prompt)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

pub async fn mark_completed(db: &PgPool, id: Uuid, image_key: &str) -> anyhow::Result<()> {
    sqlx::query(&format!(
        "UPDATE recipe_images SET image_key = $2, status = '{}' WHERE id = $1",
        status::COMPLETED
    ))
    .bind(id)
    .bind(image_key)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn mark_failed(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(&format!(
        "UPDATE recipe_images SET status = '{}' WHERE id = $1",
        status::FAILED
    ))
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn has_accepted(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM recipe_images WHERE recipe_id = $1 AND is_accepted)",
    )
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn set_recipe_image_status(
    db: &PgPool,
    recipe_id: Uuid,
    status: &str,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE recipes SET image_status = $2, updated_at = now() WHERE id = $1")
        .bind(recipe_id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}

/// Accept one image: unset every other accepted row for the recipe, set this
/// one, and copy the key onto the recipe. Runs inside the caller's
/// transaction so the one-accepted-image invariant holds at every commit.
pub async fn accept_image_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    image_id: Uuid,
    image_key: &str,
    image_prompt: Option<&str>,
    image_source: &str,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE recipe_images SET is_accepted = FALSE WHERE recipe_id = $1 AND is_accepted")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("UPDATE recipe_images SET is_accepted = TRUE WHERE id = $1")
        .bind(image_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(&format!(
        r#"
        UPDATE recipes
           SET image_key = $2,
               image_status = '{completed}',
               image_source = $3,
               image_prompt = COALESCE($4, image_prompt),
               updated_at = now()
         WHERE id = $1
        "#,
        completed = status::COMPLETED,
    ))
    .bind(recipe_id)
    .bind(image_key)
    .bind(image_source)
    .bind(image_prompt)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Bump the day's generation counter and return the new count. The atomic
/// upsert keeps concurrent generations from sneaking past the cap.
pub async fn increment_daily_count(db: &PgPool, day: Date) -> anyhow::Result<i32> {
    let count: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO image_generation_limits (day, count)
        VALUES ($1, 1)
        ON CONFLICT (day) DO UPDATE SET count = image_generation_limits.count + 1
        RETURNING count
        "#,
    )
    .bind(day)
    .fetch_one(db)
    .await?;
    Ok(count)
}
