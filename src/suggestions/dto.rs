use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub model_id: String,
    pub prompt: String,
    #[serde(default)]
    pub existing_recipes: Vec<ExistingRecipe>,
}

#[derive(Debug, Deserialize)]
pub struct ExistingRecipe {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedRecipe {
    pub name: String,
    pub description: String,
    pub image_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub estimated_cost: f64,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub recipes: Vec<SuggestedRecipe>,
    pub raw_response: String,
    pub parse_error: bool,
    pub usage: Option<SuggestionUsage>,
}
