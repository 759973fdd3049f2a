//! End-to-end walkthrough: boot a local server, register an identity,
//! upload a file, and download it back.
//!
//! Run with `cargo run --example register_upload_download`.

use fileshare_client::{ClientConfig, FileShareClient};
use fileshare_crypto::PrivateKeyBundle;
use fileshare_server::state::AppState;
use fileshare_server::{routes::create_router, ServerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let storage_dir = tempfile::tempdir()?;
    let server_config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        storage_dir: storage_dir.path().to_string_lossy().to_string(),
        ..ServerConfig::default()
    };

    let state = Arc::new(AppState::new(server_config).await?);
    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server task panicked");
    });

    let download_dir = tempfile::tempdir()?;
    let identity = PrivateKeyBundle::generate();
    let client = FileShareClient::new(
        ClientConfig::new(format!("http://{addr}")).with_download_dir(download_dir.path()),
        identity,
        "alice",
    )?;

    println!("registering alice...");
    client.register().await?;

    println!("uploading hello.txt...");
    let outcome = client.upload(b"hello, end-to-end encrypted world", "hello.txt").await?;
    println!("server assigned file_id {}", outcome.file_id);

    println!("downloading file_id {}...", outcome.file_id);
    let downloaded = client.download(outcome.file_id).await?;
    let contents = tokio::fs::read(&downloaded.saved_to).await?;
    println!(
        "recovered {} bytes, saved to {}: {:?}",
        contents.len(),
        downloaded.saved_to.display(),
        String::from_utf8_lossy(&contents)
    );

    Ok(())
}
