//! End-to-end tests of [`fileshare_client::FileShareClient`] against a real
//! in-process [`fileshare_server`], exercising register/upload/download/list
//! /share/revoke/delete over actual HTTP.

use fileshare_client::{ClientConfig, FileShareClient};
use fileshare_crypto::PrivateKeyBundle;
use fileshare_server::state::AppState;
use fileshare_server::{routes::create_router, ServerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Boot a fileshare-server on an ephemeral port backed by an in-memory
/// SQLite database and a fresh temp directory for blobs. Returns the base
/// URL and a guard that, when dropped, removes the temp directory.
async fn spawn_server() -> (String, tempfile::TempDir) {
    let storage_dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        storage_dir: storage_dir.path().to_string_lossy().to_string(),
        ..ServerConfig::default()
    };

    let state = Arc::new(AppState::new(config).await.unwrap());
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), storage_dir)
}

fn make_client(endpoint: &str, username: &str, download_dir: &std::path::Path) -> FileShareClient {
    let config = ClientConfig::new(endpoint).with_download_dir(download_dir);
    let identity = PrivateKeyBundle::generate();
    FileShareClient::new(config, identity, username).unwrap()
}

#[tokio::test]
async fn register_upload_download_round_trips() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());

    alice.register().await.unwrap();

    let outcome = alice.upload(b"hello world", "greeting.txt").await.unwrap();
    let downloaded = alice.download(outcome.file_id).await.unwrap();

    assert_eq!(downloaded.filename, "greeting.txt");
    assert!(downloaded.is_owner);
    let contents = tokio::fs::read(&downloaded.saved_to).await.unwrap();
    assert_eq!(contents, b"hello world");
}

#[tokio::test]
async fn shared_recipient_can_decrypt_after_owner_shares() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    let bob = make_client(&endpoint, "bob", download_dir.path());

    alice.register().await.unwrap();
    bob.register().await.unwrap();

    let outcome = alice.upload(b"shared secret", "secret.txt").await.unwrap();
    alice.share(outcome.file_id, "bob").await.unwrap();

    let downloaded = bob.download(outcome.file_id).await.unwrap();
    assert!(!downloaded.is_owner);
    assert_eq!(downloaded.owner_username, "alice");
    let contents = tokio::fs::read(&downloaded.saved_to).await.unwrap();
    assert_eq!(contents, b"shared secret");
}

#[tokio::test]
async fn download_before_share_is_rejected() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    let bob = make_client(&endpoint, "bob", download_dir.path());

    alice.register().await.unwrap();
    bob.register().await.unwrap();

    let outcome = alice.upload(b"not yours", "private.txt").await.unwrap();
    let result = bob.download(outcome.file_id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn revoked_share_is_rejected_on_next_download() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    let bob = make_client(&endpoint, "bob", download_dir.path());

    alice.register().await.unwrap();
    bob.register().await.unwrap();

    let outcome = alice.upload(b"revocable", "r.txt").await.unwrap();
    alice.share(outcome.file_id, "bob").await.unwrap();
    bob.download(outcome.file_id).await.unwrap();

    alice.revoke(outcome.file_id, "bob").await.unwrap();
    let result = bob.download(outcome.file_id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn self_share_is_rejected() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    alice.register().await.unwrap();

    let outcome = alice.upload(b"mine", "m.txt").await.unwrap();
    let result = alice.share(outcome.file_id, "alice").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn list_reports_owned_and_shared_files() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    let bob = make_client(&endpoint, "bob", download_dir.path());

    alice.register().await.unwrap();
    bob.register().await.unwrap();

    let a = alice.upload(b"file a", "a.txt").await.unwrap();
    let _b = alice.upload(b"file b", "b.txt").await.unwrap();
    alice.share(a.file_id, "bob").await.unwrap();

    let alice_page = alice.list(1).await.unwrap();
    assert_eq!(alice_page.files.len(), 2);

    let bob_page = bob.list(1).await.unwrap();
    assert_eq!(bob_page.files.len(), 1);
    assert_eq!(bob_page.files[0].file_id, a.file_id);
    assert!(!bob_page.files[0].is_owner);
}

#[tokio::test]
async fn deleted_file_is_no_longer_downloadable() {
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    alice.register().await.unwrap();

    let outcome = alice.upload(b"gone soon", "g.txt").await.unwrap();
    alice.delete(outcome.file_id).await.unwrap();

    let result = alice.download(outcome.file_id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn independent_uploads_keep_independent_envelopes() {
    // Each upload gets its own FEK/MEK even for the same client; downloading
    // the first file must never pick up the second file's envelope.
    let (endpoint, _guard) = spawn_server().await;
    let download_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&endpoint, "alice", download_dir.path());
    alice.register().await.unwrap();

    let first = alice.upload(b"first version", "v1.txt").await.unwrap();
    let second = alice.upload(b"second version", "v2.txt").await.unwrap();
    assert_ne!(first.file_id, second.file_id);

    let first_downloaded = alice.download(first.file_id).await.unwrap();
    let first_contents = tokio::fs::read(&first_downloaded.saved_to).await.unwrap();
    let second_downloaded = alice.download(second.file_id).await.unwrap();
    let second_contents = tokio::fs::read(&second_downloaded.saved_to).await.unwrap();

    assert_eq!(first_contents, b"first version");
    assert_eq!(second_contents, b"second version");
}
