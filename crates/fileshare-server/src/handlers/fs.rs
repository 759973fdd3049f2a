//! `/api/fs/*` routes (§4.4): upload, download, list, share, revoke,
//! delete. Every handler here runs behind [`crate::middleware::auth_middleware`],
//! so an [`AuthenticatedUser`] extension is always present.

use crate::state::{AppState, AuthenticatedUser};
use crate::ApiError;
use axum::{extract::State, http::StatusCode, Extension, Json};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::Utc;
use fileshare_core::domain::{validate_file_id, validate_page};
use fileshare_crypto::{verify_file_signature, PublicKeyBundle};
use fileshare_store::{DownloadEntry, FileListEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn b64_decode(field: &str, value: &str) -> Result<Vec<u8>, ApiError> {
    B64.decode(value).map_err(|_| ApiError::InvalidInput(format!("{field} is not valid base64")))
}

fn b64(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

// ------------------------------------------------------------------ upload

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_content: String,
    pub metadata: String,
    pub pre_quantum_signature: String,
    pub post_quantum_signature: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub file_id: i64,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let file_ct = b64_decode("file_content", &body.file_content)?;
    let metadata_ct = b64_decode("metadata", &body.metadata)?;
    let pre_quantum_signature = b64_decode("pre_quantum_signature", &body.pre_quantum_signature)?;
    let post_quantum_signature = b64_decode("post_quantum_signature", &body.post_quantum_signature)?;

    let owner = state.store.get_user_by_id(caller.user_id).await?;
    let bundle = PublicKeyBundle::from_json_bytes(&owner.public_key_bundle)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    verify_file_signature(&bundle, &caller.username, &file_ct, &metadata_ct, &pre_quantum_signature, &post_quantum_signature)
        .map_err(|_| ApiError::Unauthorized)?;

    // Disk write happens before the DB insert (spec.md §4.4): on DB
    // failure the blob is removed so neither a dangling file nor a
    // dangling row survives.
    let storage_path = state.blobs.write_new(&file_ct).await?;

    let insert_result = state
        .store
        .insert_file(caller.user_id, &storage_path, &metadata_ct, &pre_quantum_signature, &post_quantum_signature, Utc::now().timestamp())
        .await;

    let file = match insert_result {
        Ok(file) => file,
        Err(e) => {
            let _ = state.blobs.delete(&storage_path).await;
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(UploadResponse { file_id: file.file_id })))
}

// ---------------------------------------------------------------- download

#[derive(Deserialize)]
pub struct DownloadRequest {
    pub file_id: i64,
}

#[derive(Serialize)]
pub struct SharedAccessView {
    pub access_id: i64,
    pub encrypted_fek: String,
    pub encrypted_fek_nonce: String,
    pub encrypted_mek: String,
    pub encrypted_mek_nonce: String,
    pub ephemeral_public_key: String,
    pub file_content_nonce: String,
    pub metadata_nonce: String,
    pub shared_at: i64,
}

#[derive(Serialize)]
pub struct DownloadResponse {
    pub file_content: String,
    pub metadata: String,
    pub pre_quantum_signature: String,
    pub post_quantum_signature: String,
    pub is_owner: bool,
    pub owner_user_id: i64,
    pub owner_username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_access: Option<SharedAccessView>,
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    validate_file_id(body.file_id)?;

    let entry: DownloadEntry = state
        .store
        .resolve_access(body.file_id, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let file_content = state
        .blobs
        .read(&entry.file.storage_path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let shared_access = entry.shared_access.as_ref().map(|sa| SharedAccessView {
        access_id: sa.access_id,
        encrypted_fek: b64(&sa.encrypted_fek),
        encrypted_fek_nonce: b64(&sa.encrypted_fek_nonce),
        encrypted_mek: b64(&sa.encrypted_mek),
        encrypted_mek_nonce: b64(&sa.encrypted_mek_nonce),
        ephemeral_public_key: b64(&sa.ephemeral_public_key),
        file_content_nonce: b64(&sa.file_content_nonce),
        metadata_nonce: b64(&sa.metadata_nonce),
        shared_at: sa.shared_at,
    });

    Ok(Json(DownloadResponse {
        file_content: b64(&file_content),
        metadata: b64(&entry.file.metadata),
        pre_quantum_signature: b64(&entry.file.pre_quantum_signature),
        post_quantum_signature: b64(&entry.file.post_quantum_signature),
        is_owner: entry.is_owner,
        owner_user_id: entry.file.owner_user_id,
        owner_username: entry.owner_username,
        shared_access,
    }))
}

// -------------------------------------------------------------------- list

#[derive(Deserialize)]
pub struct ListRequest {
    pub page: i64,
}

#[derive(Serialize)]
pub struct ListEntryView {
    pub file_id: i64,
    pub metadata: String,
    pub pre_quantum_signature: String,
    pub post_quantum_signature: String,
    pub is_owner: bool,
    pub owner_username: String,
    pub upload_timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_access: Option<SharedAccessView>,
}

impl From<FileListEntry> for ListEntryView {
    fn from(entry: FileListEntry) -> Self {
        let shared_access = entry.shared_access.as_ref().map(|sa| SharedAccessView {
            access_id: sa.access_id,
            encrypted_fek: b64(&sa.encrypted_fek),
            encrypted_fek_nonce: b64(&sa.encrypted_fek_nonce),
            encrypted_mek: b64(&sa.encrypted_mek),
            encrypted_mek_nonce: b64(&sa.encrypted_mek_nonce),
            ephemeral_public_key: b64(&sa.ephemeral_public_key),
            file_content_nonce: b64(&sa.file_content_nonce),
            metadata_nonce: b64(&sa.metadata_nonce),
            shared_at: sa.shared_at,
        });

        Self {
            file_id: entry.file_id,
            metadata: b64(&entry.metadata),
            pre_quantum_signature: b64(&entry.pre_quantum_signature),
            post_quantum_signature: b64(&entry.post_quantum_signature),
            is_owner: entry.is_owner,
            owner_username: entry.owner_username,
            upload_timestamp: entry.upload_timestamp,
            shared_access,
        }
    }
}

#[derive(Serialize)]
pub struct ListResponse {
    #[serde(rename = "fileData")]
    pub file_data: Vec<ListEntryView>,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<ListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
    validate_page(body.page)?;

    let (entries, has_next_page) = state.store.list_page(caller.user_id, body.page).await?;
    Ok(Json(ListResponse {
        file_data: entries.into_iter().map(ListEntryView::from).collect(),
        has_next_page,
    }))
}

// ------------------------------------------------------------------- share

#[derive(Deserialize)]
pub struct ShareRequest {
    pub file_id: i64,
    pub shared_with_username: String,
    pub encrypted_fek: String,
    pub encrypted_fek_nonce: String,
    pub encrypted_mek: String,
    pub encrypted_mek_nonce: String,
    pub ephemeral_public_key: String,
    pub file_content_nonce: String,
    pub metadata_nonce: String,
}

pub async fn share(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<ShareRequest>,
) -> Result<(StatusCode, Json<super::keyhandler::MessageResponse>), ApiError> {
    validate_file_id(body.file_id)?;

    if body.shared_with_username == caller.username {
        return Err(ApiError::InvalidInput("Cannot share file with self".to_string()));
    }

    let recipient = state
        .store
        .get_user_by_username(&body.shared_with_username)
        .await
        .map_err(|_| ApiError::InvalidInput("Unknown user".to_string()))?;

    let file = state
        .store
        .get_file(body.file_id)
        .await
        .map_err(|_| ApiError::InvalidInput("Unknown file".to_string()))?;

    if file.owner_user_id != caller.user_id {
        return Err(ApiError::Forbidden);
    }

    let encrypted_fek = b64_decode("encrypted_fek", &body.encrypted_fek)?;
    let encrypted_fek_nonce = b64_decode("encrypted_fek_nonce", &body.encrypted_fek_nonce)?;
    let encrypted_mek = b64_decode("encrypted_mek", &body.encrypted_mek)?;
    let encrypted_mek_nonce = b64_decode("encrypted_mek_nonce", &body.encrypted_mek_nonce)?;
    let ephemeral_public_key = b64_decode("ephemeral_public_key", &body.ephemeral_public_key)?;
    let file_content_nonce = b64_decode("file_content_nonce", &body.file_content_nonce)?;
    let metadata_nonce = b64_decode("metadata_nonce", &body.metadata_nonce)?;

    state
        .store
        .insert_shared_access(
            caller.user_id,
            recipient.user_id,
            body.file_id,
            &encrypted_fek,
            &encrypted_fek_nonce,
            &encrypted_mek,
            &encrypted_mek_nonce,
            &ephemeral_public_key,
            &file_content_nonce,
            &metadata_nonce,
            Utc::now().timestamp(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(super::keyhandler::MessageResponse { message: "File shared successfully".to_string() }),
    ))
}

// ------------------------------------------------------------------ revoke

#[derive(Deserialize)]
pub struct RevokeRequest {
    pub file_id: i64,
    pub username: String,
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<RevokeRequest>,
) -> Result<Json<super::keyhandler::MessageResponse>, ApiError> {
    validate_file_id(body.file_id)?;

    if body.username == caller.username {
        return Err(ApiError::InvalidInput("Cannot revoke access from self".to_string()));
    }

    let recipient = state
        .store
        .get_user_by_username(&body.username)
        .await
        .map_err(|_| ApiError::InvalidInput("Unknown user".to_string()))?;

    let file = state
        .store
        .get_file(body.file_id)
        .await
        .map_err(|_| ApiError::InvalidInput("Unknown file".to_string()))?;

    if file.owner_user_id != caller.user_id {
        return Err(ApiError::Forbidden);
    }

    state.store.delete_shared_access(caller.user_id, recipient.user_id, body.file_id).await?;

    Ok(Json(super::keyhandler::MessageResponse { message: "File access revoked successfully".to_string() }))
}

// ------------------------------------------------------------------ delete

#[derive(Deserialize)]
pub struct DeleteRequest {
    pub file_id: i64,
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<super::keyhandler::MessageResponse>, ApiError> {
    validate_file_id(body.file_id)?;

    let file = state
        .store
        .get_file(body.file_id)
        .await
        .map_err(|_| ApiError::InvalidInput("Unknown file".to_string()))?;

    if file.owner_user_id != caller.user_id {
        return Err(ApiError::Forbidden);
    }

    // Disk removal is idempotent, so it's safe to run before the row
    // delete: a crash between the two steps leaves no on-disk blob, and a
    // retry of this handler simply finds nothing left to unlink.
    state.blobs.delete(&file.storage_path).await?;
    state.store.delete_file(body.file_id).await?;

    Ok(Json(super::keyhandler::MessageResponse { message: "File deleted successfully".to_string() }))
}
