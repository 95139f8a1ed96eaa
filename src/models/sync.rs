use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, instrument};

use super::repo;
use crate::openrouter::{price_per_million, RawModel};
use crate::state::AppState;

const SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_CONTEXT_WINDOW: i32 = 4096;

/// A free model as it will be stored locally.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeModel {
    pub model_id: String,
    pub name: String,
    pub input_price: f64,
    pub output_price: f64,
    pub context_window: i32,
}

/// Keep only zero-cost text-to-text models from the upstream catalogue.
/// A model whose price cannot be parsed is not known to be free and is dropped.
pub fn filter_free_models(raw: Vec<RawModel>) -> Vec<FreeModel> {
    raw.into_iter()
        .filter_map(|m| {
            let input_price =
                price_per_million(m.pricing.as_ref().and_then(|p| p.prompt.as_ref()))?;
            let output_price =
                price_per_million(m.pricing.as_ref().and_then(|p| p.completion.as_ref()))?;
            let modality = m
                .architecture
                .as_ref()
                .and_then(|a| a.modality.as_deref())
                .unwrap_or("");
            let is_text_model = modality.contains("text->text");
            if input_price != 0.0 || output_price != 0.0 || !is_text_model {
                return None;
            }
            Some(FreeModel {
                model_id: m.id,
                name: m.name,
                input_price,
                output_price,
                context_window: m
                    .context_length
                    .map(|c| c as i32)
                    .unwrap_or(DEFAULT_CONTEXT_WINDOW),
            })
        })
        .collect()
}

/// Locally cached ids with no upstream counterpart; these get deleted.
pub fn stale_ids(existing: &[String], fetched: &[FreeModel]) -> Vec<String> {
    let fetched_ids: HashSet<&str> = fetched.iter().map(|m| m.model_id.as_str()).collect();
    existing
        .iter()
        .filter(|id| !fetched_ids.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Pull the upstream catalogue and reconcile the local table: upsert every
/// fetched row, delete the stale ones, all in one transaction.
#[instrument(skip(st))]
pub async fn sync_models(st: &AppState) -> anyhow::Result<usize> {
    let raw = st.openrouter.list_models().await?;
    let fetched = filter_free_models(raw);
    let existing = repo::list_ids(&st.db).await?;
    let stale = stale_ids(&existing, &fetched);

    let mut tx = st.db.begin().await.context("begin tx")?;
    for model in &fetched {
        repo::upsert_tx(
            &mut tx,
            &model.model_id,
            &model.name,
            model.input_price,
            model.output_price,
            model.context_window,
        )
        .await?;
    }
    for id in &stale {
        repo::delete_tx(&mut tx, id).await?;
    }
    tx.commit().await.context("commit tx")?;

    info!(upserted = fetched.len(), removed = stale.len(), "model list synced");
    Ok(fetched.len())
}

/// Run the sync once at startup and then every 24 hours.
pub fn spawn_daily_sync(st: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SYNC_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sync_models(&st).await {
                error!(error = %e, "model sync failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, prompt: &str, completion: &str, modality: &str) -> RawModel {
        serde_json::from_value(json!({
            "id": id,
            "name": id.to_uppercase(),
            "pricing": { "prompt": prompt, "completion": completion },
            "architecture": { "modality": modality },
            "context_length": 32768
        }))
        .unwrap()
    }

    #[test]
    fn keeps_only_free_text_models() {
        let free = filter_free_models(vec![
            raw("a/free", "0", "0", "text->text"),
            raw("b/paid", "0.000001", "0", "text->text"),
            raw("c/paid-out", "0", "0.000002", "text->text"),
            raw("d/vision", "0", "0", "text+image->text"),
        ]);
        let ids: Vec<&str> = free.iter().map(|m| m.model_id.as_str()).collect();
        assert_eq!(ids, vec!["a/free"]);
        assert_eq!(free[0].context_window, 32768);
    }

    #[test]
    fn missing_pricing_counts_as_free() {
        let m: RawModel = serde_json::from_value(json!({
            "id": "x/y",
            "name": "XY",
            "architecture": { "modality": "text->text" }
        }))
        .unwrap();
        let free = filter_free_models(vec![m]);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].context_window, DEFAULT_CONTEXT_WINDOW);
    }

    #[test]
    fn unparseable_price_is_excluded() {
        let free = filter_free_models(vec![
            raw("a/free", "0", "0", "text->text"),
            raw("b/odd", "not-a-price", "0", "text->text"),
            raw("c/odd", "0", "not-a-price", "text->text"),
        ]);
        let ids: Vec<&str> = free.iter().map(|m| m.model_id.as_str()).collect();
        assert_eq!(ids, vec!["a/free"]);
    }

    #[test]
    fn missing_modality_is_excluded() {
        let m: RawModel = serde_json::from_value(json!({ "id": "x/y", "name": "XY" })).unwrap();
        assert!(filter_free_models(vec![m]).is_empty());
    }

    #[test]
    fn reconciliation_diff_removes_stale_and_keeps_current() {
        let existing = vec!["a/free".to_string(), "gone/model".to_string()];
        let fetched = filter_free_models(vec![raw("a/free", "0", "0", "text->text")]);
        let stale = stale_ids(&existing, &fetched);
        assert_eq!(stale, vec!["gone/model".to_string()]);
    }

    #[test]
    fn empty_upstream_marks_everything_stale() {
        let existing = vec!["a".to_string(), "b".to_string()];
        let stale = stale_ids(&existing, &[]);
        assert_eq!(stale, existing);
    }
}
