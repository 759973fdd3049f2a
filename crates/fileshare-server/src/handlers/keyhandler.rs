//! `POST /api/keyhandler/register` and `POST /api/keyhandler/getbundle`
//! (§4.4): the identity registry backing the request-authentication layer.

use crate::state::{AppState, AuthenticatedUser};
use crate::ApiError;
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use fileshare_core::domain::validate_username;
use fileshare_crypto::PublicKeyBundle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub key_bundle: serde_json::Value,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Not authenticated: a user has no keys to sign with before registering.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    validate_username(&body.username)?;

    let bundle_bytes = serde_json::to_vec(&body.key_bundle).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    // Round-trip through PublicKeyBundle so the persisted bytes are the
    // canonical form (§6), not whatever whitespace/key-order the client sent.
    let bundle = PublicKeyBundle::from_json_bytes(&bundle_bytes)
        .map_err(|e| ApiError::InvalidInput(format!("invalid key_bundle: {e}")))?;
    let canonical_bytes = bundle.to_json_bytes()?;

    state
        .store
        .create_user(&body.username, &canonical_bytes, Utc::now().timestamp())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "User registered".to_string() }),
    ))
}

#[derive(Deserialize)]
pub struct GetBundleRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct GetBundleResponse {
    pub key_bundle: serde_json::Value,
}

pub async fn get_bundle(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthenticatedUser>,
    Json(body): Json<GetBundleRequest>,
) -> Result<Json<GetBundleResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_username(&body.username)
        .await
        .map_err(|_| ApiError::InvalidInput("Invalid username".to_string()))?;

    let key_bundle: serde_json::Value =
        serde_json::from_slice(&user.public_key_bundle).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(GetBundleResponse { key_bundle }))
}
