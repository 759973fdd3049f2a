//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Connection and behavior settings for a [`crate::FileShareClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `http://localhost:8080`.
    pub endpoint: String,
    /// Connect + read timeout applied to every request (§5: expiration
    /// surfaces as a `Network` error kind).
    pub timeout: Duration,
    /// Directory downloaded plaintext is written to.
    pub download_dir: PathBuf,
    /// User agent string sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            download_dir: PathBuf::from("./downloads"),
            user_agent: format!("fileshare-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}
