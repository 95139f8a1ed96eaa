use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::GenerationError;
use super::repo::{self, source, status, RecipeImage};
use crate::auth::repo_types::User;
use crate::recipes::{self, repo::Recipe};
use crate::state::AppState;

pub const DAILY_LIMIT: i32 = 10;
pub const UPLOADED_PROMPT: &str = "Uploaded image";

/// The templated prompt sent to the image provider.
pub fn full_prompt(dish: &str) -> String {
    format!(
        "Professional food photography of {dish}, appetizing presentation, \
         natural lighting, shallow depth of field, high quality, on a beautiful plate"
    )
}

/// Explicit prompt, else the recipe's stored prompt, else its name.
pub fn effective_prompt(arg: Option<&str>, recipe: &Recipe) -> String {
    arg.map(str::trim)
        .filter(|p| !p.is_empty())
        .or(recipe.image_prompt.as_deref())
        .unwrap_or(&recipe.name)
        .to_string()
}

fn object_key(recipe_id: Uuid, image_id: Uuid, ext: &str) -> String {
    format!("recipes/{recipe_id}/{image_id}.{ext}")
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// `new_count` is the counter value after its atomic bump, so the tenth
/// request sees 10 and passes while the eleventh sees 11 and is rejected.
fn over_cap(new_count: i32) -> bool {
    new_count > DAILY_LIMIT
}

fn db_err(e: anyhow::Error) -> GenerationError {
    error!(error = %e, "image workflow db error");
    GenerationError::Other(e.to_string())
}

/// The generation workflow: permission gate, daily cap, provider call,
/// storage upload, bookkeeping. The counter is bumped before the external
/// call; on failure both the variant row and the recipe are flagged failed
/// and the caller gets one of the fixed user-facing messages.
pub async fn generate_recipe_image(
    st: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    prompt_arg: Option<&str>,
) -> Result<Uuid, GenerationError> {
    let recipe = recipes::repo::get(&st.db, recipe_id)
        .await
        .map_err(db_err)?
        .ok_or(GenerationError::RecipeNotFound)?;

    let user = User::find_by_id(&st.db, user_id)
        .await
        .map_err(db_err)?
        .ok_or(GenerationError::NotAuthenticated)?;
    if !user.can_generate_images {
        return Err(GenerationError::GenerationDisabled);
    }

    let today = OffsetDateTime::now_utc().date();
    let count = repo::increment_daily_count(&st.db, today)
        .await
        .map_err(db_err)?;
    if over_cap(count) {
        warn!(%count, "daily generation limit reached");
        return Err(GenerationError::DailyLimitReached { limit: DAILY_LIMIT });
    }

    repo::set_recipe_image_status(&st.db, recipe_id, status::GENERATING)
        .await
        .map_err(db_err)?;

    let prompt = effective_prompt(prompt_arg, &recipe);
    let entry = repo::insert_generating(&st.db, user_id, recipe_id, &prompt)
        .await
        .map_err(db_err)?;

    match run_generation(st, &recipe, &entry, &prompt).await {
        Ok(()) => {
            info!(recipe_id = %recipe.id, image_id = %entry.id, "image generated");
            Ok(entry.id)
        }
        Err(e) => {
            error!(recipe_id = %recipe.id, image_id = %entry.id, error = ?e, "generation failed");
            if let Err(e) = repo::mark_failed(&st.db, entry.id).await {
                error!(error = %e, "failed to flag image row");
            }
            if let Err(e) = repo::set_recipe_image_status(&st.db, recipe.id, status::FAILED).await {
                error!(error = %e, "failed to flag recipe");
            }
            Err(e)
        }
    }
}

async fn run_generation(
    st: &AppState,
    recipe: &Recipe,
    entry: &RecipeImage,
    prompt: &str,
) -> Result<(), GenerationError> {
    let body = st.image_gen.generate(&full_prompt(prompt)).await?;

    let key = object_key(recipe.id, entry.id, "webp");
    st.storage
        .put_object(&key, body, "image/webp")
        .await
        .map_err(|e| GenerationError::Upload(e.to_string()))?;

    repo::mark_completed(&st.db, entry.id, &key)
        .await
        .map_err(db_err)?;

    // First image for the recipe is accepted automatically.
    if !repo::has_accepted(&st.db, recipe.id).await.map_err(db_err)? {
        accept(st, recipe.id, entry.id, &key, Some(prompt), source::AI)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

/// Accept an image as the recipe's display photo in one transaction.
pub async fn accept(
    st: &AppState,
    recipe_id: Uuid,
    image_id: Uuid,
    image_key: &str,
    image_prompt: Option<&str>,
    image_source: &str,
) -> anyhow::Result<()> {
    let mut tx = st.db.begin().await.context("begin tx")?;
    repo::accept_image_tx(&mut tx, recipe_id, image_id, image_key, image_prompt, image_source)
        .await?;
    tx.commit().await.context("commit tx")?;
    Ok(())
}

/// Store an uploaded dish photo and make it the recipe's accepted image.
pub async fn attach_uploaded_image(
    st: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<Uuid> {
    let ext = ext_from_mime(content_type)
        .ok_or_else(|| anyhow::anyhow!("unsupported content type {content_type}"))?;

    let image_id = Uuid::new_v4();
    let key = object_key(recipe_id, image_id, ext);
    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    let inserted =
        repo::insert_completed_tx(&mut tx, user_id, recipe_id, &key, UPLOADED_PROMPT).await?;
    repo::accept_image_tx(
        &mut tx,
        recipe_id,
        inserted,
        &key,
        Some(UPLOADED_PROMPT),
        source::UPLOAD,
    )
    .await?;
    tx.commit().await.context("commit tx")?;

    info!(%recipe_id, image_id = %inserted, "uploaded image attached");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn recipe(image_prompt: Option<&str>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: "Beef Rendang".into(),
            description: None,
            rating: None,
            image_key: None,
            image_status: None,
            image_source: None,
            image_prompt: image_prompt.map(Into::into),
            last_cooked_at: None,
            created_by: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn prompt_prefers_explicit_argument() {
        let r = recipe(Some("slow-cooked beef curry"));
        assert_eq!(effective_prompt(Some("rendang close-up"), &r), "rendang close-up");
    }

    #[test]
    fn prompt_falls_back_to_stored_then_name() {
        let r = recipe(Some("slow-cooked beef curry"));
        assert_eq!(effective_prompt(None, &r), "slow-cooked beef curry");
        assert_eq!(effective_prompt(Some("   "), &r), "slow-cooked beef curry");
        let r = recipe(None);
        assert_eq!(effective_prompt(None, &r), "Beef Rendang");
    }

    #[test]
    fn full_prompt_templates_the_dish() {
        let p = full_prompt("shakshuka");
        assert!(p.starts_with("Professional food photography of shakshuka"));
        assert!(p.contains("natural lighting"));
    }

    #[test]
    fn object_keys_are_scoped_by_recipe() {
        let recipe_id = Uuid::new_v4();
        let image_id = Uuid::new_v4();
        let key = object_key(recipe_id, image_id, "webp");
        assert_eq!(key, format!("recipes/{recipe_id}/{image_id}.webp"));
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[test]
    fn tenth_generation_passes_eleventh_is_rejected() {
        assert!(!over_cap(1));
        assert!(!over_cap(DAILY_LIMIT));
        assert!(over_cap(DAILY_LIMIT + 1));
        assert_eq!(DAILY_LIMIT, 10);
    }
}
