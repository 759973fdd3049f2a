//! Main client implementation: request signing, the upload/download/list
//! /share/revoke/delete handlers (§4.5), and the local envelope cache they
//! share.

use crate::config::ClientConfig;
use crate::envelope_store::EnvelopeStore;
use crate::error::{ClientError, Result};
use crate::types::*;
use base64::Engine;
use fileshare_core::sign_request;
use fileshare_crypto::{
    decrypt_file, encrypt_file, sign_file, unwrap_for_recipient, verify_file_signature,
    wrap_for_recipient, Envelope, Iv, PrivateKeyBundle, PublicKeyBundle,
};
use reqwest::Client;
use tracing::{debug, instrument};

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn b64_decode(s: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| ClientError::InvalidResponse(format!("invalid base64: {e}")))
}

/// A signed-in client identity: an end-to-end encrypted file sharing client
/// bound to one username and one key bundle.
pub struct FileShareClient {
    config: ClientConfig,
    http: Client,
    identity: PrivateKeyBundle,
    username: String,
    envelopes: EnvelopeStore,
}

impl FileShareClient {
    /// Build a client for `username`, authenticating every protected call
    /// with `identity`.
    pub fn new(config: ClientConfig, identity: PrivateKeyBundle, username: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            http,
            identity,
            username: username.into(),
            envelopes: EnvelopeStore::new(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint)
    }

    /// POST an unauthenticated JSON request (registration has no caller to
    /// sign as yet).
    async fn post_unauthenticated<T: serde::de::DeserializeOwned>(&self, path: &str, body: &[u8]) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body.to_vec())
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// POST a signed JSON request (§4.1/§4.2): builds the `X-Username`,
    /// `X-Timestamp` and `X-Signature` headers over the exact body bytes
    /// that get sent.
    async fn post_signed<T: serde::de::DeserializeOwned>(&self, path: &str, body: &[u8]) -> Result<T> {
        let headers = sign_request(&self.identity, &self.username, "POST", path, body, chrono::Utc::now());
        let response = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .header("X-Username", headers.x_username)
            .header("X-Timestamp", headers.x_timestamp)
            .header("X-Signature", headers.x_signature)
            .body(body.to_vec())
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(ClientError::Server { status: status.as_u16(), message });
        }
        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Register this identity's public key bundle with the server (§4.5 §1).
    #[instrument(skip(self))]
    pub async fn register(&self) -> Result<()> {
        let key_bundle: serde_json::Value =
            serde_json::from_slice(&self.identity.public_bundle().to_json_bytes()?)
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let request = RegisterRequest { username: self.username.clone(), key_bundle };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let _: MessageResponse = self.post_unauthenticated("/api/keyhandler/register", &body).await?;
        Ok(())
    }

    /// Fetch another user's public key bundle, e.g. before sharing a file
    /// with them.
    #[instrument(skip(self))]
    pub async fn get_bundle(&self, username: &str) -> Result<PublicKeyBundle> {
        let request = GetBundleRequest { username: username.to_string() };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let response: GetBundleResponse = self.post_signed("/api/keyhandler/getbundle", &body).await?;
        let raw = serde_json::to_vec(&response.key_bundle).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(PublicKeyBundle::from_json_bytes(&raw)?)
    }

    /// Encrypt, sign and upload `plaintext` as `filename` (§4.3 upload).
    /// Caches the envelope locally, keyed by the server-assigned `file_id`.
    #[instrument(skip(self, plaintext))]
    pub async fn upload(&self, plaintext: &[u8], filename: &str) -> Result<UploadOutcome> {
        let encrypted = encrypt_file(plaintext, filename)?;
        let signature = sign_file(&self.identity, &self.username, &encrypted.file_ct, &encrypted.metadata_ct)?;

        let request = UploadRequest {
            file_content: b64(&encrypted.file_ct),
            metadata: b64(&encrypted.metadata_ct),
            pre_quantum_signature: b64(&signature.pre_quantum),
            post_quantum_signature: b64(&signature.post_quantum),
        };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let response: UploadResponse = self.post_signed("/api/fs/upload", &body).await?;

        self.envelopes.insert(response.file_id, encrypted.envelope);
        debug!(file_id = response.file_id, "uploaded file");
        Ok(UploadOutcome { file_id: response.file_id, filename: filename.to_string() })
    }

    /// Download, verify and decrypt a file, writing the plaintext under
    /// [`ClientConfig::download_dir`] (§4.3 download). Signature or
    /// decryption failures abort before anything is written to disk.
    #[instrument(skip(self))]
    pub async fn download(&self, file_id: i64) -> Result<DownloadedFile> {
        let request = DownloadRequest { file_id };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let response: DownloadResponse = self.post_signed("/api/fs/download", &body).await?;

        let file_ct = b64_decode(&response.file_content)?;
        let metadata_ct = b64_decode(&response.metadata)?;
        let pre_quantum_signature = b64_decode(&response.pre_quantum_signature)?;
        let post_quantum_signature = b64_decode(&response.post_quantum_signature)?;

        let owner_bundle = self.get_bundle(&response.owner_username).await?;
        verify_file_signature(
            &owner_bundle,
            &response.owner_username,
            &file_ct,
            &metadata_ct,
            &pre_quantum_signature,
            &post_quantum_signature,
        )?;

        let envelope = self.resolve_envelope(file_id, &response)?;
        let decrypted = decrypt_file(&file_ct, &metadata_ct, &envelope)?;

        if response.is_owner {
            self.envelopes.insert(file_id, envelope);
        }

        tokio::fs::create_dir_all(&self.config.download_dir).await?;
        let saved_to = self.config.download_dir.join(&decrypted.filename);
        tokio::fs::write(&saved_to, &decrypted.plaintext).await?;

        Ok(DownloadedFile {
            file_id,
            filename: decrypted.filename,
            filesize: decrypted.filesize,
            saved_to,
            is_owner: response.is_owner,
            owner_username: response.owner_username,
        })
    }

    /// Recover the envelope for a downloaded file: the local cache if we
    /// already hold it, or unwrap the share-key material the server
    /// attached for this recipient.
    fn resolve_envelope(&self, file_id: i64, response: &DownloadResponse) -> Result<Envelope> {
        if let Some(envelope) = self.envelopes.get(file_id) {
            return Ok(envelope);
        }

        let shared = response
            .shared_access
            .as_ref()
            .ok_or(ClientError::EnvelopeMissing(file_id))?;

        let ephemeral_public_key: [u8; 32] = b64_decode(&shared.ephemeral_public_key)?
            .try_into()
            .map_err(|_| ClientError::InvalidResponse("ephemeral public key must be 32 bytes".into()))?;
        let encrypted_fek = b64_decode(&shared.encrypted_fek)?;
        let encrypted_fek_nonce = Iv::from_bytes(&b64_decode(&shared.encrypted_fek_nonce)?)?;
        let encrypted_mek = b64_decode(&shared.encrypted_mek)?;
        let encrypted_mek_nonce = Iv::from_bytes(&b64_decode(&shared.encrypted_mek_nonce)?)?;

        let (fek, mek) = unwrap_for_recipient(
            &self.identity,
            &ephemeral_public_key,
            &encrypted_fek,
            &encrypted_fek_nonce,
            &encrypted_mek,
            &encrypted_mek_nonce,
        )?;

        let file_nonce = Iv::from_bytes(&b64_decode(&shared.file_content_nonce)?)?;
        let metadata_nonce = Iv::from_bytes(&b64_decode(&shared.metadata_nonce)?)?;

        Ok(Envelope { fek, mek, file_nonce, metadata_nonce })
    }

    /// List a page of files the caller owns or has been shared (§4.5 list).
    /// Entries whose metadata this client cannot decrypt are dropped rather
    /// than failing the whole page.
    #[instrument(skip(self))]
    pub async fn list(&self, page: i64) -> Result<ListPage> {
        let request = ListRequest { page };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let response: ListResponseWire = self.post_signed("/api/fs/list", &body).await?;

        let mut files = Vec::with_capacity(response.file_data.len());
        for entry in response.file_data {
            match self.decrypt_list_entry(&entry) {
                Ok(listed) => files.push(listed),
                Err(e) => {
                    tracing::warn!(file_id = entry.file_id, error = %e, "skipping undecryptable list entry");
                }
            }
        }

        Ok(ListPage { files, has_next_page: response.has_next_page })
    }

    fn decrypt_list_entry(&self, entry: &ListEntryWire) -> Result<ListedFile> {
        let metadata_ct = b64_decode(&entry.metadata)?;

        let (mek, metadata_nonce) = if let Some(envelope) = self.envelopes.get(entry.file_id) {
            (envelope.mek, envelope.metadata_nonce)
        } else {
            let shared = entry
                .shared_access
                .as_ref()
                .ok_or(ClientError::EnvelopeMissing(entry.file_id))?;
            let ephemeral_public_key: [u8; 32] = b64_decode(&shared.ephemeral_public_key)?
                .try_into()
                .map_err(|_| ClientError::InvalidResponse("ephemeral public key must be 32 bytes".into()))?;
            let encrypted_mek = b64_decode(&shared.encrypted_mek)?;
            let encrypted_mek_nonce = Iv::from_bytes(&b64_decode(&shared.encrypted_mek_nonce)?)?;
            let fek_nonce = Iv::from_bytes(&b64_decode(&shared.encrypted_fek_nonce)?)?;
            let encrypted_fek = b64_decode(&shared.encrypted_fek)?;

            let (_fek, mek) = unwrap_for_recipient(
                &self.identity,
                &ephemeral_public_key,
                &encrypted_fek,
                &fek_nonce,
                &encrypted_mek,
                &encrypted_mek_nonce,
            )?;
            let metadata_nonce = Iv::from_bytes(&b64_decode(&shared.metadata_nonce)?)?;
            (mek, metadata_nonce)
        };

        let metadata_plain = fileshare_crypto::symmetric::decrypt(&mek, &metadata_nonce, &metadata_ct)?;
        let metadata: fileshare_crypto::FileMetadata = serde_json::from_slice(&metadata_plain)
            .map_err(|_| ClientError::InvalidResponse("list metadata is not valid JSON".into()))?;

        Ok(ListedFile {
            file_id: entry.file_id,
            filename: metadata.filename,
            filesize: metadata.filesize,
            is_owner: entry.is_owner,
            owner_username: entry.owner_username.clone(),
            upload_timestamp: entry.upload_timestamp,
        })
    }

    /// Share a file this client owns with `recipient_username` (§4.3 share).
    /// Wraps the locally-cached FEK/MEK for the recipient's X25519 public key.
    #[instrument(skip(self))]
    pub async fn share(&self, file_id: i64, recipient_username: &str) -> Result<()> {
        let envelope = self
            .envelopes
            .get(file_id)
            .ok_or(ClientError::EnvelopeMissing(file_id))?;
        let recipient_bundle = self.get_bundle(recipient_username).await?;
        let wrap = wrap_for_recipient(&envelope, &recipient_bundle.x25519_pub)?;

        let request = ShareRequest {
            file_id,
            shared_with_username: recipient_username.to_string(),
            encrypted_fek: b64(&wrap.encrypted_fek),
            encrypted_fek_nonce: b64(wrap.encrypted_fek_nonce.as_bytes()),
            encrypted_mek: b64(&wrap.encrypted_mek),
            encrypted_mek_nonce: b64(wrap.encrypted_mek_nonce.as_bytes()),
            ephemeral_public_key: b64(&wrap.ephemeral_public_key),
            file_content_nonce: b64(envelope.file_nonce.as_bytes()),
            metadata_nonce: b64(envelope.metadata_nonce.as_bytes()),
        };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let _: MessageResponse = self.post_signed("/api/fs/share", &body).await?;
        Ok(())
    }

    /// Revoke a previously granted share (§4.3 revoke). Idempotent on the
    /// server: revoking an already-revoked share is not an error.
    #[instrument(skip(self))]
    pub async fn revoke(&self, file_id: i64, shared_with_username: &str) -> Result<()> {
        let request = RevokeRequest { file_id, username: shared_with_username.to_string() };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let _: MessageResponse = self.post_signed("/api/fs/revoke", &body).await?;
        Ok(())
    }

    /// Delete a file this client owns (§4.3 delete). Cascades shares
    /// server-side; drops the local envelope either way.
    #[instrument(skip(self))]
    pub async fn delete(&self, file_id: i64) -> Result<()> {
        let request = DeleteRequest { file_id };
        let body = serde_json::to_vec(&request).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let _: MessageResponse = self.post_signed("/api/fs/delete", &body).await?;
        self.envelopes.remove(file_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> FileShareClient {
        let config = ClientConfig::new("http://localhost:8080");
        let identity = PrivateKeyBundle::generate();
        FileShareClient::new(config, identity, "alice").unwrap()
    }

    #[test]
    fn url_joins_endpoint_and_path() {
        let client = test_client();
        assert_eq!(client.url("/api/fs/upload"), "http://localhost:8080/api/fs/upload");
    }

    #[test]
    fn username_is_preserved() {
        let client = test_client();
        assert_eq!(client.username(), "alice");
    }

    #[test]
    fn resolve_envelope_fails_without_local_cache_or_share() {
        let client = test_client();
        let response = DownloadResponse {
            file_content: String::new(),
            metadata: String::new(),
            pre_quantum_signature: String::new(),
            post_quantum_signature: String::new(),
            is_owner: false,
            owner_user_id: 1,
            owner_username: "bob".to_string(),
            shared_access: None,
        };
        let result = client.resolve_envelope(99, &response);
        assert!(matches!(result, Err(ClientError::EnvelopeMissing(99))));
    }
}
