//! Error types for the persistence layer (C8).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("file not found")]
    FileNotFound,

    #[error("shared-access record not found")]
    AccessNotFound,

    #[error("file is already shared with this user")]
    AlreadyShared,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("blob storage error: {0}")]
    Io(#[from] std::io::Error),
}
