//! SQLite-backed relational store.
//!
//! The transfer core treats the product schema as opaque beyond the columns
//! it dumps and the owning-user reference it rewrites on import. The pool
//! setup (WAL, embedded migrations, in-memory variant for tests) is the main
//! entry point for every query the pipelines run.

pub mod restore;
pub mod rows;

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::debug;

use crate::account::ProfileSnapshot;
use crate::common::errors::{Result, TransferError};
use rows::{
    ActivityRow, ConnectedAppRow, FileMetadataRow, NotificationRow, RecentFileRow, RelationalDump,
    SettingsRow, UserRecord,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await?;
        let store = Self { pool };
        MIGRATOR.run(&store.pool).await?;
        Ok(store)
    }

    /// Connect to the store at the given path, creating the database file
    /// and running migrations as needed.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::base_options()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::new(options, None).await
    }

    /// In-memory store, limited to one connection so every handle sees the
    /// same database. Used by tests and kept public so integration tests in
    /// other crates can use it too.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        Self::new(options, Some(1)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The account being exported: the host's earliest-created user row.
    pub async fn active_user(&self) -> Result<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, display_name, avatar, setup_complete, email_verified, created_at \
             FROM users ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TransferError::UserMissing)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, display_name, avatar, setup_complete, email_verified, created_at \
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TransferError::UserMissing)
    }

    /// Insert-or-update the user by email, the natural key. Transfer
    /// bypasses onboarding and verification, so both flags are forced true.
    /// The password hash written here is the only password the import
    /// pipeline ever touches.
    pub async fn upsert_user(
        &self,
        profile: &ProfileSnapshot,
        password_hash: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, display_name, avatar, password_hash, setup_complete, email_verified, created_at) \
             VALUES (?1, ?2, ?3, ?4, 1, 1, ?5) \
             ON CONFLICT (email) DO UPDATE SET \
               display_name = excluded.display_name, \
               avatar = excluded.avatar, \
               password_hash = excluded.password_hash, \
               setup_complete = 1, \
               email_verified = 1 \
             RETURNING id",
        )
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.avatar)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Read every transfer-covered table for one user in a single pass.
    /// Read-only, so no explicit transaction is needed. Connected-app
    /// credentials are stripped by simply never selecting the token column.
    pub async fn dump_for_user(&self, user_id: i64) -> Result<RelationalDump> {
        let settings = sqlx::query_as::<_, SettingsRow>(
            "SELECT user_id, theme, locale, storage_quota_bytes, notifications_enabled \
             FROM settings WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let file_metadata = sqlx::query_as::<_, FileMetadataRow>(
            "SELECT user_id, path, category, size_bytes, mime_type, starred, modified_at \
             FROM file_metadata WHERE user_id = ?1 ORDER BY path ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let recent_files = sqlx::query_as::<_, RecentFileRow>(
            "SELECT user_id, path, accessed_at \
             FROM recent_files WHERE user_id = ?1 ORDER BY accessed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let connected_apps = sqlx::query_as::<_, ConnectedAppRow>(
            "SELECT user_id, provider, display_name, scopes \
             FROM connected_apps WHERE user_id = ?1 ORDER BY provider ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let activity_log = sqlx::query_as::<_, ActivityRow>(
            "SELECT user_id, action, detail, created_at \
             FROM activity_log WHERE user_id = ?1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let notifications = sqlx::query_as::<_, NotificationRow>(
            "SELECT user_id, kind, body, is_read, created_at \
             FROM notifications WHERE user_id = ?1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let dump = RelationalDump {
            settings,
            file_metadata,
            recent_files,
            connected_apps,
            activity_log,
            notifications,
        };
        debug!(user_id, rows = dump.total_rows(), "built relational dump");
        Ok(dump)
    }

    pub async fn create_session(&self, user_id: i64, token: &str) -> Result<()> {
        sqlx::query("INSERT INTO sessions (user_id, token, created_at) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(token)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
