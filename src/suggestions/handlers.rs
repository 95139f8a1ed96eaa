use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, instrument, warn};

use super::dto::{SuggestionRequest, SuggestionResponse, SuggestionUsage};
use super::services::{build_user_prompt, estimated_cost, parse_suggestions, SYSTEM_PROMPT};
use crate::openrouter::{ChatMessage, ChatRequest};
use crate::{auth::AuthUser, models, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/suggestions", post(generate_suggestions))
}

#[instrument(skip(state, payload))]
pub async fn generate_suggestions(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>, (StatusCode, String)> {
    if payload.prompt.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Prompt is required".into()));
    }
    if !state.openrouter.has_api_key() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "OpenRouter API key not configured. Please add OPENROUTER_API_KEY to your environment."
                .into(),
        ));
    }

    let model = models::repo::get(&state.db, &payload.model_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((
            StatusCode::BAD_REQUEST,
            format!("Unknown model: {}", payload.model_id),
        ))?;

    let request = ChatRequest {
        model: payload.model_id.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: build_user_prompt(&payload.existing_recipes, &payload.prompt),
            },
        ],
        temperature: 0.7,
        max_tokens: 2000,
    };

    let result = state.openrouter.chat(&request).await.map_err(|e| {
        error!(error = %e, model = %payload.model_id, "suggestion request failed");
        (
            StatusCode::BAD_GATEWAY,
            format!("Failed to generate suggestions: {e}"),
        )
    })?;

    let raw_response = result
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();

    let (recipes, parse_error) = parse_suggestions(&raw_response);
    if parse_error {
        warn!(model = %payload.model_id, "suggestions reply was not valid JSON");
    }

    let usage = result.usage.map(|u| SuggestionUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        estimated_cost: estimated_cost(
            u.prompt_tokens,
            u.completion_tokens,
            model.input_price,
            model.output_price,
        ),
    });

    Ok(Json(SuggestionResponse {
        recipes,
        raw_response,
        parse_error,
        usage,
    }))
}
