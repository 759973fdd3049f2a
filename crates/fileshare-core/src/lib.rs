//! # fileshare-core
//!
//! The canonical-request signing scheme (C6) and the domain record types
//! (§3) shared by the server and the client. Neither side should construct
//! a canonical string or validate a username except through here.

pub mod canonical;
pub mod domain;
pub mod error;

pub use canonical::{
    canonical_string, format_timestamp, pack_signature, sign_request, unpack_signature,
    verify_request, SignedRequestHeaders, REPLAY_WINDOW_SECONDS,
};
pub use domain::{
    validate_file_id, validate_page, validate_username, FileRecord, SharedAccessRecord,
    UserRecord, ValidationError, LIST_PAGE_SIZE,
};
pub use error::{AuthError, Result};
