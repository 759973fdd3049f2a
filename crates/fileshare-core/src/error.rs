//! Error kinds shared by the canonical-signing layer. These are surfaced by
//! name (§7 of the request-authentication contract), not by type — callers
//! in `fileshare-server` map each variant onto its HTTP status.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("timestamp outside the replay window")]
    ReplayWindowExceeded,

    #[error("malformed signature header")]
    MalformedSignature,

    #[error("unknown username")]
    UnknownUser,

    #[error("signature verification failed")]
    SignatureVerification,
}
