//! End-to-end walkthrough of sharing and revocation: alice uploads a file,
//! shares it with bob, bob reads it, alice revokes access, and bob's next
//! download attempt is rejected.
//!
//! Run with `cargo run --example share_and_revoke`.

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

    let endpoint = format!("http://{addr}");
    let alice_downloads = tempfile::tempdir()?;
    let bob_downloads = tempfile::tempdir()?;

    let alice = FileShareClient::new(
        ClientConfig::new(&endpoint).with_download_dir(alice_downloads.path()),
        PrivateKeyBundle::generate(),
        "alice",
    )?;
    let bob = FileShareClient::new(
        ClientConfig::new(&endpoint).with_download_dir(bob_downloads.path()),
        PrivateKeyBundle::generate(),
        "bob",
    )?;

    alice.register().await?;
    bob.register().await?;

    let outcome = alice.upload(b"quarterly figures, for bob's eyes only", "figures.txt").await?;
    println!("alice uploaded file_id {}", outcome.file_id);

    println!("alice shares file_id {} with bob", outcome.file_id);
    alice.share(outcome.file_id, "bob").await?;

    let downloaded = bob.download(outcome.file_id).await?;
    println!("bob successfully decrypted shared file: {}", downloaded.filename);

    println!("alice revokes bob's access");
    alice.revoke(outcome.file_id, "bob").await?;

    match bob.download(outcome.file_id).await {
        Ok(_) => println!("unexpected: bob could still download after revocation"),
        Err(e) => println!("bob's download correctly rejected after revocation: {e}"),
    }

    Ok(())
}
