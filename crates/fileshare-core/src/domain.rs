//! Shared domain types (§3) and their validation rules. Both the server's
//! persistence layer and the client's request builders depend on these so
//! that "what a valid username looks like" has exactly one definition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must match ^[A-Za-z0-9_]{{3,50}}$")]
    InvalidUsername,
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("file_id must be a positive integer")]
    InvalidFileId,
}

/// `^[A-Za-z0-9_]{3,50}$`
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(ValidationError::InvalidUsername);
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(())
}

/// Pages are 1-indexed.
pub fn validate_page(page: i64) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::InvalidPage);
    }
    Ok(())
}

pub fn validate_file_id(file_id: i64) -> Result<(), ValidationError> {
    if file_id < 1 {
        return Err(ValidationError::InvalidFileId);
    }
    Ok(())
}

/// Page size used by `POST /api/fs/list` (§4.4).
pub const LIST_PAGE_SIZE: u32 = 25;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    /// The UTF-8 bytes of the user's `key_bundle`'s canonical JSON form (§6).
    pub public_key_bundle: Vec<u8>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: i64,
    pub owner_user_id: i64,
    pub storage_path: String,
    /// Ciphertext of `{filename, filesize}`, encrypted under MEK.
    pub metadata: Vec<u8>,
    pub pre_quantum_signature: Vec<u8>,
    pub post_quantum_signature: Vec<u8>,
    pub upload_timestamp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedAccessRecord {
    pub access_id: i64,
    pub owner_user_id: i64,
    pub shared_with_user_id: i64,
    pub file_id: i64,
    pub encrypted_fek: Vec<u8>,
    pub encrypted_fek_nonce: Vec<u8>,
    pub encrypted_mek: Vec<u8>,
    pub encrypted_mek_nonce: Vec<u8>,
    pub ephemeral_public_key: Vec<u8>,
    pub file_content_nonce: Vec<u8>,
    pub metadata_nonce: Vec<u8>,
    pub shared_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", true)]
    #[case("ab", false)] // too short
    #[case("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", false)] // 51 chars, too long
    #[case("alice_01", true)]
    #[case("alice-01", false)] // hyphen not allowed
    #[case("alice 01", false)] // space not allowed
    fn username_validation(#[case] candidate: &str, #[case] expect_ok: bool) {
        assert_eq!(validate_username(candidate).is_ok(), expect_ok);
    }

    #[test]
    fn page_must_be_positive() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_page(-1).is_err());
    }

    #[test]
    fn file_id_must_be_positive() {
        assert!(validate_file_id(1).is_ok());
        assert!(validate_file_id(0).is_err());
    }
}
