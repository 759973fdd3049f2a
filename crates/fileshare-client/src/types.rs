//! Wire DTOs for the `/api/keyhandler/*` and `/api/fs/*` routes (§4.4, §6)
//! and the result types each handler in [`crate::client`] returns.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------- register

#[derive(Serialize)]
pub(crate) struct RegisterRequest {
    pub username: String,
    pub key_bundle: serde_json::Value,
}

#[derive(Deserialize)]
pub(crate) struct MessageResponse {
    #[allow(dead_code)]
    pub message: String,
}

// --------------------------------------------------------------- getbundle

#[derive(Serialize)]
pub(crate) struct GetBundleRequest {
    pub username: String,
}

#[derive(Deserialize)]
pub(crate) struct GetBundleResponse {
    pub key_bundle: serde_json::Value,
}

// ------------------------------------------------------------------ upload

#[derive(Serialize)]
pub(crate) struct UploadRequest {
    pub file_content: String,
    pub metadata: String,
    pub pre_quantum_signature: String,
    pub post_quantum_signature: String,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    pub file_id: i64,
}

/// Result of a successful upload: the spec's contract only promises
/// `file_id`, but we hand back the filename too since callers usually want
/// to confirm what they just sent.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    pub file_id: i64,
    pub filename: String,
}

// ---------------------------------------------------------------- download

#[derive(Serialize)]
pub(crate) struct DownloadRequest {
    pub file_id: i64,
}

#[derive(Deserialize)]
pub(crate) struct SharedAccessWire {
    #[allow(dead_code)]
    pub access_id: i64,
    pub encrypted_fek: String,
    pub encrypted_fek_nonce: String,
    pub encrypted_mek: String,
    pub encrypted_mek_nonce: String,
    pub ephemeral_public_key: String,
    pub file_content_nonce: String,
    pub metadata_nonce: String,
    #[allow(dead_code)]
    pub shared_at: i64,
}

#[derive(Deserialize)]
pub(crate) struct DownloadResponse {
    pub file_content: String,
    pub metadata: String,
    pub pre_quantum_signature: String,
    pub post_quantum_signature: String,
    pub is_owner: bool,
    #[allow(dead_code)]
    pub owner_user_id: i64,
    pub owner_username: String,
    pub shared_access: Option<SharedAccessWire>,
}

/// A downloaded, verified and decrypted file, written to the caller's
/// download directory.
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    pub file_id: i64,
    pub filename: String,
    pub filesize: u64,
    pub saved_to: std::path::PathBuf,
    pub is_owner: bool,
    pub owner_username: String,
}

// -------------------------------------------------------------------- list

#[derive(Serialize)]
pub(crate) struct ListRequest {
    pub page: i64,
}

#[derive(Deserialize)]
pub(crate) struct ListEntryWire {
    pub file_id: i64,
    pub metadata: String,
    #[allow(dead_code)]
    pub pre_quantum_signature: String,
    #[allow(dead_code)]
    pub post_quantum_signature: String,
    pub is_owner: bool,
    pub owner_username: String,
    pub upload_timestamp: i64,
    pub shared_access: Option<SharedAccessWire>,
}

#[derive(Deserialize)]
pub(crate) struct ListResponseWire {
    #[serde(rename = "fileData")]
    pub file_data: Vec<ListEntryWire>,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}

/// One successfully decrypted entry of a `list` page. Entries whose
/// metadata fails to decrypt are dropped by [`crate::client::FileShareClient::list`]
/// rather than aborting the whole page (§4.5).
#[derive(Clone, Debug)]
pub struct ListedFile {
    pub file_id: i64,
    pub filename: String,
    pub filesize: u64,
    pub is_owner: bool,
    pub owner_username: String,
    pub upload_timestamp: i64,
}

/// A page of `list` results, plus whether another page follows.
#[derive(Clone, Debug)]
pub struct ListPage {
    pub files: Vec<ListedFile>,
    pub has_next_page: bool,
}

// ------------------------------------------------------------------- share

#[derive(Serialize)]
pub(crate) struct ShareRequest {
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

// ------------------------------------------------------------------ revoke

#[derive(Serialize)]
pub(crate) struct RevokeRequest {
    pub file_id: i64,
    pub username: String,
}

// ------------------------------------------------------------------ delete

#[derive(Serialize)]
pub(crate) struct DeleteRequest {
    pub file_id: i64,
}

#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
