//! Client error kinds (§7). Every operation that could leak plaintext on
//! failure checks a [`ClientError::Crypto`] *before* writing anything to
//! disk — signature and unwrap failures are fatal to that operation and
//! never partially materialize a download.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Connect/read failure or transport-level error (§7 `Network`). No
    /// retry policy is implied here; callers see at-most-once semantics.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server returned a well-formed `{"message": ...}` error body.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Crypto-layer failure (§7 `CryptoFailure`): signature mismatch,
    /// wrong key/nonce lengths, or a decryption/unwrap that didn't recover
    /// valid plaintext or metadata.
    #[error("cryptographic failure: {0}")]
    Crypto(#[from] fileshare_crypto::CryptoError),

    /// Asked to operate on a file this client has no local envelope for
    /// (not the owner, and no shared-access record was returned either).
    #[error("no local envelope or shared access for file {0}")]
    EnvelopeMissing(i64),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server's response didn't parse as the expected shape.
    #[error("malformed server response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// True for crypto-layer failures the spec calls `CryptoFailure` (§7).
    pub fn is_crypto_failure(&self) -> bool {
        matches!(self, ClientError::Crypto(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_display_includes_status_and_message() {
        let err = ClientError::Server { status: 404, message: "File not found".to_string() };
        assert_eq!(err.to_string(), "server error (404): File not found");
    }

    #[test]
    fn crypto_errors_are_identified() {
        let err = ClientError::Crypto(fileshare_crypto::CryptoError::SignatureVerification);
        assert!(err.is_crypto_failure());
        let other = ClientError::EnvelopeMissing(1);
        assert!(!other.is_crypto_failure());
    }
}
