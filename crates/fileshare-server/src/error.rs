//! API error types (§7) and their JSON response shape.
//!
//! Every error response is `{"message": <string>}`, optionally with an
//! `"errors"` array of field-level validation messages for `400`s. This
//! replaces the teacher's S3-style `<Error>` XML envelope entirely: this
//! system does not claim S3 compatibility, so `ApiError::into_response`
//! emits JSON instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A duplicate-share conflict specifically (§4.4 share route), which
    /// the spec distinguishes from other conflicts with its own status.
    #[error("share conflict: {0}")]
    ShareConflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::ShareConflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidInput(m) => m.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Forbidden => "Unauthorized".to_string(),
            ApiError::NotFound(m) => m.clone(),
            ApiError::Conflict(m) => m.clone(),
            ApiError::ShareConflict(m) => m.clone(),
            ApiError::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref detail) = self {
            tracing::error!(error = %detail, "internal error");
        }
        let status = self.status();
        let body = ErrorBody { message: self.message() };
        (status, Json(body)).into_response()
    }
}

impl From<fileshare_core::AuthError> for ApiError {
    fn from(_e: fileshare_core::AuthError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<fileshare_core::domain::ValidationError> for ApiError {
    fn from(e: fileshare_core::domain::ValidationError) -> Self {
        ApiError::InvalidInput(e.to_string())
    }
}

impl From<fileshare_store::StoreError> for ApiError {
    fn from(e: fileshare_store::StoreError) -> Self {
        use fileshare_store::StoreError as E;
        match e {
            E::UsernameTaken => ApiError::Conflict("Username already taken".to_string()),
            E::UserNotFound => ApiError::InvalidInput("Unknown user".to_string()),
            E::FileNotFound => ApiError::InvalidInput("Unknown file".to_string()),
            E::AccessNotFound => ApiError::NotFound("File is not shared with this user".to_string()),
            E::AlreadyShared => ApiError::ShareConflict("File is already shared with this user".to_string()),
            E::Database(err) => ApiError::Internal(err.to_string()),
            E::Io(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<fileshare_crypto::CryptoError> for ApiError {
    fn from(e: fileshare_crypto::CryptoError) -> Self {
        ApiError::InvalidInput(e.to_string())
    }
}
