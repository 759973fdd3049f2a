//! Server configuration

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// `sqlx` connection string for the relational store, e.g.
    /// `sqlite://fileshare.db` or `sqlite::memory:`.
    pub database_url: String,
    /// Directory under which ciphertext blobs are written.
    pub storage_dir: String,
    /// Maximum request body size, in bytes. Upload bodies carry whole file
    /// ciphertexts base64-encoded, so this must exceed the largest
    /// supported file by a comfortable margin.
    pub max_body_size: usize,
    /// Enable permissive CORS (the HTTP surface has no origin restrictions
    /// stated in the protocol itself).
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "sqlite://fileshare.db".to_string(),
            storage_dir: "./data/blobs".to_string(),
            max_body_size: 256 * 1024 * 1024, // 256 MiB
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
