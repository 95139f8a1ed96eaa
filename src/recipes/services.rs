use tracing::warn;
use uuid::Uuid;

use super::dto::RecipeResponse;
use super::repo::{self, Recipe};
use crate::state::AppState;

pub const PRESIGN_TTL_SECS: u64 = 600;

/// Attach a presigned URL for the recipe's accepted image, if any.
pub async fn with_image_url(st: &AppState, recipe: Recipe) -> RecipeResponse {
    let image_url = match recipe.image_key.as_deref() {
        Some(key) => match st.storage.presign_get(key, PRESIGN_TTL_SECS).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, %key, "presign failed");
                None
            }
        },
        None => None,
    };
    RecipeResponse::from_recipe(recipe, image_url)
}

/// Delete the recipe row (DB cascades take the history, schedule and image
/// rows) and then best-effort delete its stored objects. Object deletion
/// failures are logged, not surfaced: the rows are already gone.
pub async fn delete_with_objects(st: &AppState, id: Uuid) -> anyhow::Result<bool> {
    let keys = repo::collect_image_keys(&st.db, id).await?;
    let deleted = repo::delete(&st.db, id).await?;
    if !deleted {
        return Ok(false);
    }
    for key in keys {
        if let Err(e) = st.storage.delete_object(&key).await {
            warn!(error = %e, %key, "failed to delete stored image");
        }
    }
    Ok(true)
}

pub fn is_valid_rating(rating: Option<i16>) -> bool {
    rating.map_or(true, |r| (1..=5).contains(&r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn recipe(image_key: Option<&str>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: "Shakshuka".into(),
            description: Some("Eggs in spiced tomato sauce".into()),
            rating: Some(5),
            image_key: image_key.map(Into::into),
            image_status: image_key.map(|_| "completed".into()),
            image_source: image_key.map(|_| "ai".into()),
            image_prompt: None,
            last_cooked_at: None,
            created_by: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn rating_bounds() {
        assert!(is_valid_rating(None));
        assert!(is_valid_rating(Some(1)));
        assert!(is_valid_rating(Some(5)));
        assert!(!is_valid_rating(Some(0)));
        assert!(!is_valid_rating(Some(6)));
        assert!(!is_valid_rating(Some(-3)));
    }

    #[tokio::test]
    async fn response_carries_presigned_url() {
        let st = AppState::fake();
        let r = with_image_url(&st, recipe(Some("recipes/a/b.webp"))).await;
        assert_eq!(r.image_url.as_deref(), Some("https://fake.local/recipes/a/b.webp"));
    }

    #[tokio::test]
    async fn response_without_image_has_no_url() {
        let st = AppState::fake();
        let r = with_image_url(&st, recipe(None)).await;
        assert!(r.image_url.is_none());
    }
}
