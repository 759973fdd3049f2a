//! On-disk ciphertext blob storage.
//!
//! Each file's content ciphertext lives under `base_dir` at a path derived
//! from a cryptographically random suffix, generated independently of the
//! database row. That keeps writes per-`storage_path` lock-free (spec.md
//! §5: "no in-process locking is required") and lets upload write the blob
//! to disk *before* the database insert, matching §4.4's "perform the DB
//! insert last" rule without needing the row's `file_id` up front.

use crate::error::{Result, StoreError};
use rand::RngCore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct BlobStore {
    base_dir: PathBuf,
}

impl BlobStore {
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn resolve(&self, storage_path: &str) -> PathBuf {
        self.base_dir.join(storage_path)
    }

    /// Generate a fresh, collision-free relative path for a new blob.
    fn new_storage_path() -> String {
        let mut suffix = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut suffix);
        format!("{}.blob", hex::encode(suffix))
    }

    /// Write `content` to a freshly allocated path. Writes to a temp file in
    /// the same directory and renames into place so a crash mid-write never
    /// leaves a partial blob visible at the final path.
    pub async fn write_new(&self, content: &[u8]) -> Result<String> {
        let storage_path = Self::new_storage_path();
        let final_path = self.resolve(&storage_path);
        let tmp_path = self.base_dir.join(format!("{storage_path}.tmp"));

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, &final_path).await?;

        debug!(storage_path = %storage_path, bytes = content.len(), "wrote ciphertext blob");
        Ok(storage_path)
    }

    pub async fn read(&self, storage_path: &str) -> Result<Vec<u8>> {
        fs::read(self.resolve(storage_path)).await.map_err(StoreError::Io)
    }

    /// Delete a blob. Re-entrant: a missing file is not an error, so a
    /// retried or partially-completed delete can call this safely.
    pub async fn delete(&self, storage_path: &str) -> Result<()> {
        match fs::remove_file(self.resolve(storage_path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(storage_path = %storage_path, error = %e, "failed to remove blob");
                Err(StoreError::Io(e))
            }
        }
    }

    pub fn exists(&self, storage_path: &str) -> bool {
        Path::new(&self.resolve(storage_path)).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path()).await.unwrap();
        let path = store.write_new(b"ciphertext bytes").await.unwrap();
        assert_eq!(store.read(&path).await.unwrap(), b"ciphertext bytes");
    }

    #[tokio::test]
    async fn distinct_writes_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path()).await.unwrap();
        let a = store.write_new(b"one").await.unwrap();
        let b = store.write_new(b"two").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn delete_removes_blob_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path()).await.unwrap();
        let path = store.write_new(b"gone soon").await.unwrap();
        assert!(store.exists(&path));
        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path));
        // deleting again must not error
        store.delete(&path).await.unwrap();
    }
}
