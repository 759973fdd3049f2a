//! # fileshare-client
//!
//! Client SDK for the end-to-end encrypted file sharing service.
//!
//! A [`FileShareClient`] holds one user's identity ([`fileshare_crypto::PrivateKeyBundle`])
//! and signs every protected request with the hybrid Ed25519 / ML-DSA-87
//! scheme from `fileshare-core`. Files are encrypted client-side before
//! upload and decrypted client-side after download; the server only ever
//! sees ciphertext.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fileshare_client::{ClientConfig, FileShareClient};
//! use fileshare_crypto::PrivateKeyBundle;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let identity = PrivateKeyBundle::generate();
//!     let client = FileShareClient::new(
//!         ClientConfig::new("http://localhost:8080"),
//!         identity,
//!         "alice",
//!     )?;
//!     client.register().await?;
//!
//!     let outcome = client.upload(b"hello world", "hello.txt").await?;
//!     let downloaded = client.download(outcome.file_id).await?;
//!     println!("saved to {:?}", downloaded.saved_to);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod envelope_store;
mod error;
mod types;

pub use client::FileShareClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use types::{DownloadedFile, ListPage, ListedFile, UploadOutcome};
