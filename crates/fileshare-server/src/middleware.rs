//! Request-authentication middleware (C9): the hybrid dual-signature and
//! replay-window checks spec.md §4.2 requires in front of every protected
//! route.

use crate::state::{AppState, AuthenticatedUser};
use crate::ApiError;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use fileshare_core::canonical::verify_request;
use fileshare_crypto::PublicKeyBundle;
use std::sync::Arc;
use uuid::Uuid;

const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Verify `X-Username` / `X-Timestamp` / `X-Signature` against the claimed
/// user's public key bundle, per §4.2 steps 1-7. On success, attaches an
/// [`AuthenticatedUser`] to the request's extensions for handlers to read.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let username = header_str(&parts, "x-username")?;
    let timestamp = header_str(&parts, "x-timestamp")?;
    let signature = header_str(&parts, "x-signature")?;

    let user = state
        .store
        .get_user_by_username(&username)
        .await
        .map_err(|_| ApiError::Unauthorized)?;
    let bundle = PublicKeyBundle::from_json_bytes(&user.public_key_bundle).map_err(|_| ApiError::Unauthorized)?;

    let body_bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let method = parts.method.as_str().to_uppercase();
    let path = parts.uri.path().to_string();

    verify_request(&bundle, &username, &timestamp, &method, &path, &body_bytes, &signature, Utc::now())
        .map_err(|_| ApiError::Unauthorized)?;

    let mut request = Request::from_parts(parts, Body::from(body_bytes));
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.user_id,
        username: user.username,
    });

    Ok(next.run(request).await)
}

fn header_str(parts: &axum::http::request::Parts, name: &str) -> Result<String, ApiError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized)?;
    if value.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    Ok(value.to_string())
}

/// Attach an `X-Request-Id` to every response, for log correlation.
/// Unrelated to the §4.2 signature headers.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Log method, path, status and duration for every request, at the density
/// the teacher's gateway uses.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}
