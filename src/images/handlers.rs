use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::dto::{GenerateRequest, GenerateResponse, RecipeImageResponse};
use super::repo::{self, source, status};
use super::services;
use crate::{
    auth::AuthUser,
    recipes::{self, services::PRESIGN_TTL_SECS},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/recipes/:id/images", get(list_variants))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/:id/image/generate", post(generate_image))
        .route("/images/:id/accept", post(accept_image))
        .route(
            "/recipes/:id/image",
            post(upload_image).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
}

#[instrument(skip(state))]
pub async fn list_variants(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<Vec<RecipeImageResponse>>, (StatusCode, String)> {
    if recipes::repo::get(&state.db, recipe_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }

    let images = repo::list_by_recipe(&state.db, recipe_id)
        .await
        .map_err(internal)?;

    let mut items = Vec::with_capacity(images.len());
    for image in images {
        let image_url = match image.image_key.as_deref() {
            Some(key) if image.status == status::COMPLETED => {
                match state.storage.presign_get(key, PRESIGN_TTL_SECS).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(error = %e, %key, "presign failed");
                        None
                    }
                }
            }
            _ => None,
        };
        items.push(RecipeImageResponse::from_image(image, image_url));
    }
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn generate_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(recipe_id): Path<Uuid>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let image_entry_id =
        services::generate_recipe_image(&state, user_id, recipe_id, payload.prompt.as_deref())
            .await?;
    Ok(Json(GenerateResponse { image_entry_id }))
}

#[instrument(skip(state))]
pub async fn accept_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(image_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let image = repo::get(&state.db, image_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Image entry not found".to_string()))?;

    if image.created_by != user_id {
        return Err((StatusCode::FORBIDDEN, "Not authorized".into()));
    }
    let Some(key) = image.image_key.as_deref() else {
        return Err((StatusCode::CONFLICT, "Image is not yet available".into()));
    };

    let image_source = if image.prompt == services::UPLOADED_PROMPT {
        source::UPLOAD
    } else {
        source::AI
    };
    services::accept(
        &state,
        image.recipe_id,
        image.id,
        key,
        Some(&image.prompt),
        image_source,
    )
    .await
    .map_err(internal)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/image (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(recipe_id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<GenerateResponse>), (StatusCode, String)> {
    if recipes::repo::get(&state.db, recipe_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }

    let mut file = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            file = Some((data, content_type));
        }
    }
    let Some((body, content_type)) = file else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };

    let image_entry_id =
        services::attach_uploaded_image(&state, user_id, recipe_id, body, &content_type)
            .await
            .map_err(|e| {
                error!(error = %e, %recipe_id, "upload failed");
                if e.to_string().contains("unsupported content type") {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            })?;

    Ok((StatusCode::CREATED, Json(GenerateResponse { image_entry_id })))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
