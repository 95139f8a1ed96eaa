use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::repo::Recipe;

/// Recipe as returned to the client, with a presigned URL for the accepted
/// image when one exists.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<i16>,
    pub image_url: Option<String>,
    pub image_status: Option<String>,
    pub image_source: Option<String>,
    pub image_prompt: Option<String>,
    pub last_cooked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl RecipeResponse {
    pub fn from_recipe(recipe: Recipe, image_url: Option<String>) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            rating: recipe.rating,
            image_url,
            image_status: recipe.image_status,
            image_source: recipe.image_source,
            image_prompt: recipe.image_prompt,
            last_cooked_at: recipe.last_cooked_at,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<i16>,
}
