//! Relational store (C8): `users`, `files`, `shared_access` tables backed
//! by `sqlx`/SQLite, mirroring §3's record types.
//!
//! Queries are plain runtime-bound `sqlx::query`/`query_as` rather than the
//! `query!` compile-time macros, since this workspace never runs against a
//! live database at build time.

use crate::error::{Result, StoreError};
use fileshare_core::domain::{FileRecord, SharedAccessRecord, UserRecord, LIST_PAGE_SIZE};
use sqlx::sqlite::{SqlitePoolOptions, SqliteConnectOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    public_key_bundle BLOB NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    file_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_user_id INTEGER NOT NULL REFERENCES users(user_id),
    storage_path TEXT NOT NULL UNIQUE,
    metadata    BLOB NOT NULL,
    pre_quantum_signature BLOB NOT NULL,
    post_quantum_signature BLOB NOT NULL,
    upload_timestamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS shared_access (
    access_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_user_id INTEGER NOT NULL REFERENCES users(user_id),
    shared_with_user_id INTEGER NOT NULL REFERENCES users(user_id),
    file_id     INTEGER NOT NULL REFERENCES files(file_id) ON DELETE CASCADE,
    encrypted_fek BLOB NOT NULL,
    encrypted_fek_nonce BLOB NOT NULL,
    encrypted_mek BLOB NOT NULL,
    encrypted_mek_nonce BLOB NOT NULL,
    ephemeral_public_key BLOB NOT NULL,
    file_content_nonce BLOB NOT NULL,
    metadata_nonce BLOB NOT NULL,
    shared_at   INTEGER NOT NULL,
    UNIQUE(owner_user_id, shared_with_user_id, file_id)
);

CREATE INDEX IF NOT EXISTS idx_files_owner ON files(owner_user_id);
CREATE INDEX IF NOT EXISTS idx_shared_access_recipient ON shared_access(shared_with_user_id);
CREATE INDEX IF NOT EXISTS idx_shared_access_file ON shared_access(file_id);
"#;

/// One row of a paginated `POST /api/fs/list` response: a file the caller
/// owns, or one shared with them, tagged with `is_owner` and, for shared
/// rows, the wrapped-key material needed to decrypt it.
#[derive(Debug, Clone)]
pub struct FileListEntry {
    pub file_id: i64,
    pub owner_user_id: i64,
    pub owner_username: String,
    pub metadata: Vec<u8>,
    pub pre_quantum_signature: Vec<u8>,
    pub post_quantum_signature: Vec<u8>,
    pub upload_timestamp: i64,
    pub is_owner: bool,
    pub shared_access: Option<SharedAccessRecord>,
}

/// A resolved download: the file row plus, for non-owners, the
/// shared-access record used to unwrap FEK/MEK.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub file: FileRecord,
    pub owner_username: String,
    pub is_owner: bool,
    pub shared_access: Option<SharedAccessRecord>,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to `database_url` (e.g. `sqlite://fileshare.db` or
    /// `sqlite::memory:`) and ensure the schema exists.
    #[instrument(skip_all)]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---------------------------------------------------------------- users

    #[instrument(skip(self, public_key_bundle))]
    pub async fn create_user(&self, username: &str, public_key_bundle: &[u8], now: i64) -> Result<UserRecord> {
        let existing = sqlx::query("SELECT 1 FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StoreError::UsernameTaken);
        }

        let result = sqlx::query(
            "INSERT INTO users (username, public_key_bundle, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(username)
        .bind(public_key_bundle)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(UserRecord {
            user_id: result.last_insert_rowid(),
            username: username.to_string(),
            public_key_bundle: public_key_bundle.to_vec(),
            created_at: now,
            updated_at: now,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> Result<UserRecord> {
        let row = sqlx::query(
            "SELECT user_id, username, public_key_bundle, created_at, updated_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotFound)?;
        Ok(user_from_row(&row))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<UserRecord> {
        let row = sqlx::query(
            "SELECT user_id, username, public_key_bundle, created_at, updated_at FROM users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotFound)?;
        Ok(user_from_row(&row))
    }

    // ---------------------------------------------------------------- files

    #[instrument(skip(self, metadata, pre_quantum_signature, post_quantum_signature))]
    pub async fn insert_file(
        &self,
        owner_user_id: i64,
        storage_path: &str,
        metadata: &[u8],
        pre_quantum_signature: &[u8],
        post_quantum_signature: &[u8],
        upload_timestamp: i64,
    ) -> Result<FileRecord> {
        let result = sqlx::query(
            "INSERT INTO files (owner_user_id, storage_path, metadata, pre_quantum_signature, post_quantum_signature, upload_timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(owner_user_id)
        .bind(storage_path)
        .bind(metadata)
        .bind(pre_quantum_signature)
        .bind(post_quantum_signature)
        .bind(upload_timestamp)
        .execute(&self.pool)
        .await?;

        Ok(FileRecord {
            file_id: result.last_insert_rowid(),
            owner_user_id,
            storage_path: storage_path.to_string(),
            metadata: metadata.to_vec(),
            pre_quantum_signature: pre_quantum_signature.to_vec(),
            post_quantum_signature: post_quantum_signature.to_vec(),
            upload_timestamp,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: i64) -> Result<FileRecord> {
        let row = sqlx::query(
            "SELECT file_id, owner_user_id, storage_path, metadata, pre_quantum_signature, post_quantum_signature, upload_timestamp
             FROM files WHERE file_id = ?1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::FileNotFound)?;
        Ok(file_from_row(&row))
    }

    /// Resolve a download/list access check: is `user_id` the owner, or is
    /// there a shared-access row naming them? Returns `None` if neither.
    #[instrument(skip(self))]
    pub async fn resolve_access(&self, file_id: i64, user_id: i64) -> Result<Option<DownloadEntry>> {
        let file = match self.get_file(file_id).await {
            Ok(f) => f,
            Err(StoreError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let owner = self.get_user_by_id(file.owner_user_id).await?;

        if file.owner_user_id == user_id {
            return Ok(Some(DownloadEntry {
                file,
                owner_username: owner.username,
                is_owner: true,
                shared_access: None,
            }));
        }

        let access_row = sqlx::query(
            "SELECT access_id, owner_user_id, shared_with_user_id, file_id, encrypted_fek, encrypted_fek_nonce,
                    encrypted_mek, encrypted_mek_nonce, ephemeral_public_key, file_content_nonce, metadata_nonce, shared_at
             FROM shared_access WHERE file_id = ?1 AND shared_with_user_id = ?2",
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match access_row {
            Some(row) => Ok(Some(DownloadEntry {
                file,
                owner_username: owner.username,
                is_owner: false,
                shared_access: Some(shared_access_from_row(&row)),
            })),
            None => Ok(None),
        }
    }

    /// Delete a file's row and every shared-access row that references it.
    /// Both statements run inside one transaction so the pair is atomic;
    /// the caller is responsible for removing the on-disk blob.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM shared_access WHERE file_id = ?1")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM files WHERE file_id = ?1")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Page `page` (1-indexed, `LIST_PAGE_SIZE` rows per page) of files
    /// owned by or shared with `user_id`, newest upload first.
    #[instrument(skip(self))]
    pub async fn list_page(&self, user_id: i64, page: i64) -> Result<(Vec<FileListEntry>, bool)> {
        let limit = LIST_PAGE_SIZE as i64;
        let offset = (page - 1) * limit;

        // Fetch one extra row to detect whether a next page exists without a
        // separate COUNT query.
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT f.file_id, f.owner_user_id, ou.username AS owner_username, f.metadata,
                       f.pre_quantum_signature, f.post_quantum_signature, f.upload_timestamp,
                       1 AS is_owner,
                       NULL AS access_id, NULL AS encrypted_fek, NULL AS encrypted_fek_nonce,
                       NULL AS encrypted_mek, NULL AS encrypted_mek_nonce, NULL AS ephemeral_public_key,
                       NULL AS file_content_nonce, NULL AS metadata_nonce, NULL AS shared_at
                FROM files f
                JOIN users ou ON ou.user_id = f.owner_user_id
                WHERE f.owner_user_id = ?1

                UNION ALL

                SELECT f.file_id, f.owner_user_id, ou.username AS owner_username, f.metadata,
                       f.pre_quantum_signature, f.post_quantum_signature, f.upload_timestamp,
                       0 AS is_owner,
                       sa.access_id, sa.encrypted_fek, sa.encrypted_fek_nonce,
                       sa.encrypted_mek, sa.encrypted_mek_nonce, sa.ephemeral_public_key,
                       sa.file_content_nonce, sa.metadata_nonce, sa.shared_at
                FROM files f
                JOIN shared_access sa ON sa.file_id = f.file_id
                JOIN users ou ON ou.user_id = f.owner_user_id
                WHERE sa.shared_with_user_id = ?1
            )
            ORDER BY upload_timestamp DESC, file_id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(user_id)
        .bind(limit + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let has_next_page = rows.len() as i64 > limit;
        let entries = rows
            .into_iter()
            .take(limit as usize)
            .map(|row| list_entry_from_row(&row))
            .collect();

        Ok((entries, has_next_page))
    }

    // --------------------------------------------------------- shared_access

    #[instrument(skip(self, encrypted_fek, encrypted_fek_nonce, encrypted_mek, encrypted_mek_nonce, ephemeral_public_key))]
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_shared_access(
        &self,
        owner_user_id: i64,
        shared_with_user_id: i64,
        file_id: i64,
        encrypted_fek: &[u8],
        encrypted_fek_nonce: &[u8],
        encrypted_mek: &[u8],
        encrypted_mek_nonce: &[u8],
        ephemeral_public_key: &[u8],
        file_content_nonce: &[u8],
        metadata_nonce: &[u8],
        shared_at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO shared_access
                (owner_user_id, shared_with_user_id, file_id, encrypted_fek, encrypted_fek_nonce,
                 encrypted_mek, encrypted_mek_nonce, ephemeral_public_key, file_content_nonce, metadata_nonce, shared_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(owner_user_id)
        .bind(shared_with_user_id)
        .bind(file_id)
        .bind(encrypted_fek)
        .bind(encrypted_fek_nonce)
        .bind(encrypted_mek)
        .bind(encrypted_mek_nonce)
        .bind(ephemeral_public_key)
        .bind(file_content_nonce)
        .bind(metadata_nonce)
        .bind(shared_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::AlreadyShared),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_shared_access(&self, owner_user_id: i64, shared_with_user_id: i64, file_id: i64) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM shared_access WHERE owner_user_id = ?1 AND shared_with_user_id = ?2 AND file_id = ?3",
        )
        .bind(owner_user_id)
        .bind(shared_with_user_id)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AccessNotFound);
        }
        Ok(())
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> UserRecord {
    UserRecord {
        user_id: row.get("user_id"),
        username: row.get("username"),
        public_key_bundle: row.get("public_key_bundle"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn file_from_row(row: &sqlx::sqlite::SqliteRow) -> FileRecord {
    FileRecord {
        file_id: row.get("file_id"),
        owner_user_id: row.get("owner_user_id"),
        storage_path: row.get("storage_path"),
        metadata: row.get("metadata"),
        pre_quantum_signature: row.get("pre_quantum_signature"),
        post_quantum_signature: row.get("post_quantum_signature"),
        upload_timestamp: row.get("upload_timestamp"),
    }
}

fn shared_access_from_row(row: &sqlx::sqlite::SqliteRow) -> SharedAccessRecord {
    SharedAccessRecord {
        access_id: row.get("access_id"),
        owner_user_id: row.get("owner_user_id"),
        shared_with_user_id: row.get("shared_with_user_id"),
        file_id: row.get("file_id"),
        encrypted_fek: row.get("encrypted_fek"),
        encrypted_fek_nonce: row.get("encrypted_fek_nonce"),
        encrypted_mek: row.get("encrypted_mek"),
        encrypted_mek_nonce: row.get("encrypted_mek_nonce"),
        ephemeral_public_key: row.get("ephemeral_public_key"),
        file_content_nonce: row.get("file_content_nonce"),
        metadata_nonce: row.get("metadata_nonce"),
        shared_at: row.get("shared_at"),
    }
}

fn list_entry_from_row(row: &sqlx::sqlite::SqliteRow) -> FileListEntry {
    let is_owner: i64 = row.get("is_owner");
    let shared_access = if is_owner == 1 {
        None
    } else {
        Some(SharedAccessRecord {
            access_id: row.get("access_id"),
            owner_user_id: row.get("owner_user_id"),
            shared_with_user_id: row.get("shared_with_user_id"),
            file_id: row.get("file_id"),
            encrypted_fek: row.get("encrypted_fek"),
            encrypted_fek_nonce: row.get("encrypted_fek_nonce"),
            encrypted_mek: row.get("encrypted_mek"),
            encrypted_mek_nonce: row.get("encrypted_mek_nonce"),
            ephemeral_public_key: row.get("ephemeral_public_key"),
            file_content_nonce: row.get("file_content_nonce"),
            metadata_nonce: row.get("metadata_nonce"),
            shared_at: row.get("shared_at"),
        })
    };

    FileListEntry {
        file_id: row.get("file_id"),
        owner_user_id: row.get("owner_user_id"),
        owner_username: row.get("owner_username"),
        metadata: row.get("metadata"),
        pre_quantum_signature: row.get("pre_quantum_signature"),
        post_quantum_signature: row.get("post_quantum_signature"),
        upload_timestamp: row.get("upload_timestamp"),
        is_owner: is_owner == 1,
        shared_access,
    }
}
