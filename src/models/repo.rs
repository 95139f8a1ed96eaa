use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;

/// Cached OpenRouter price-list entry. Prices are USD per 1M tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OpenRouterModel {
    pub model_id: String,
    pub name: String,
    pub input_price: f64,
    pub output_price: f64,
    pub context_window: i32,
    pub synced_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<OpenRouterModel>> {
    let rows = sqlx::query_as::<_, OpenRouterModel>(
        r#"
        SELECT model_id, name, input_price, output_price, context_window, synced_at
        FROM openrouter_models
        ORDER BY name ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, model_id: &str) -> anyhow::Result<Option<OpenRouterModel>> {
    let row = sqlx::query_as::<_, OpenRouterModel>(
        r#"
        SELECT model_id, name, input_price, output_price, context_window, synced_at
        FROM openrouter_models
        WHERE model_id = $1
        "#,
    )
    .bind(model_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_ids(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT model_id FROM openrouter_models")
        .fetch_all(db)
        .await?;
    Ok(ids)
}

pub async fn upsert_tx(
    tx: &mut Transaction<'_, Postgres>,
    model_id: &str,
    name: &str,
    input_price: f64,
    output_price: f64,
    context_window: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO openrouter_models (model_id, name, input_price, output_price, context_window)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (model_id) DO UPDATE
           SET name = EXCLUDED.name,
               input_price = EXCLUDED.input_price,
               output_price = EXCLUDED.output_price,
               context_window = EXCLUDED.context_window,
               synced_at = now()
        "#,
    )
    .bind(model_id)
    .bind(name)
    .bind(input_price)
    .bind(output_price)
    .bind(context_window)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, model_id: &str) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM openrouter_models WHERE model_id = $1")
        .bind(model_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
