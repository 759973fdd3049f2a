//! # fileshare-server
//!
//! HTTP server for the end-to-end encrypted file sharing service (§4).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                fileshare-server                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Auth Middleware (hybrid dual signature + replay)    │
//! ├─────────────────────────────────────────────────────┤
//! │         /api/keyhandler/* and /api/fs/* handlers     │
//! ├─────────────────────────────────────────────────────┤
//! │                  fileshare-store                      │
//! │       (users / files / shared_access, blob store)    │
//! ├─────────────────────────────────────────────────────┤
//! │                  fileshare-crypto                     │
//! │        (envelope encryption, hybrid signatures)       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::run_server;
pub use state::AppState;
