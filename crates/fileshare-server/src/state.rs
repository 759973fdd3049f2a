//! Application state shared across handlers and middleware.

use crate::config::ServerConfig;
use fileshare_store::{BlobStore, Store};
use std::sync::Arc;

/// Everything a request handler needs: the relational store, the blob
/// store, and the configuration they were built from.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Store,
    pub blobs: BlobStore,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Store::connect(&config.database_url).await?;
        let blobs = BlobStore::new(&config.storage_dir).await?;
        Ok(Self { config, store, blobs })
    }
}

/// The authenticated caller, attached to request extensions by
/// [`crate::middleware::auth_middleware`] once the dual signature and
/// replay window have been verified (§4.2).
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

pub type SharedState = Arc<AppState>;
