use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::images::repo::RecipeImage;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub image_entry_id: Uuid,
}

/// One entry of a recipe's variant strip.
#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub prompt: String,
    pub status: String,
    pub is_accepted: bool,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

impl RecipeImageResponse {
    pub fn from_image(image: RecipeImage, image_url: Option<String>) -> Self {
        Self {
            id: image.id,
            recipe_id: image.recipe_id,
            prompt: image.prompt,
            status: image.status,
            is_accepted: image.is_accepted,
            image_url,
            created_at: image.created_at,
        }
    }
}
