use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, ChangePinRequest, LoginRequest, PublicUser, RefreshRequest},
        repo_types::User,
        services::{
            hash_pin, is_valid_email, is_valid_pin, verify_pin, AuthUser, JwtKeys, MIN_PIN_LEN,
        },
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/pin", post(change_pin))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn public(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        email: user.email.clone(),
        can_generate_images: user.can_generate_images,
    }
}

fn token_pair(
    state: &AppState,
    user: &User,
) -> Result<(String, String), (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let access = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let ok = verify_pin(&payload.pin, &user.pin_hash)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid pin");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let (access_token, refresh_token) = token_pair(&state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: public(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let (access_token, refresh_token) = token_pair(&state, &user)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: public(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "load user failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(public(&user)))
}

#[instrument(skip(state, payload))]
pub async fn change_pin(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePinRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !is_valid_pin(&payload.new_pin) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("PIN must be at least {MIN_PIN_LEN} characters"),
        ));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let ok = verify_pin(&payload.current_pin, &user.pin_hash)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if !ok {
        warn!(user_id = %user.id, "change_pin wrong current pin");
        return Err((StatusCode::UNAUTHORIZED, "Current PIN is incorrect".into()));
    }

    let hash = hash_pin(&payload.new_pin)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    User::update_pin_hash(&state.db, user.id, &hash)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user.id, "pin changed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_hides_pin_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "family@hearth.local".into(),
            pin_hash: "$argon2id$secret".into(),
            can_generate_images: true,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&public(&user)).unwrap();
        assert!(json.contains("family@hearth.local"));
        assert!(json.contains("can_generate_images"));
        assert!(!json.contains("argon2id"));
    }
}
