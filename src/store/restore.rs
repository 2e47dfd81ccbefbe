//! Per-table conflict policy for the relational restore.
//!
//! Every statement binds the importing host's user id, rewriting the
//! owning-user reference carried in the dump.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::rows::{
    ActivityRow, ConnectedAppRow, FileMetadataRow, NotificationRow, RecentFileRow, RowOutcome,
    SettingsRow,
};

/// One dumped row that knows how to write itself into the live store.
#[async_trait]
pub trait RestoreRow {
    const TABLE: &'static str;

    async fn restore(&self, conn: &mut SqliteConnection, user_id: i64)
        -> sqlx::Result<RowOutcome>;
}

/// Settings is a singleton per user: insert-or-update by owning user.
#[async_trait]
impl RestoreRow for SettingsRow {
    const TABLE: &'static str = "settings";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        sqlx::query(
            "INSERT INTO settings (user_id, theme, locale, storage_quota_bytes, notifications_enabled) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (user_id) DO UPDATE SET \
               theme = excluded.theme, \
               locale = excluded.locale, \
               storage_quota_bytes = excluded.storage_quota_bytes, \
               notifications_enabled = excluded.notifications_enabled",
        )
        .bind(user_id)
        .bind(&self.theme)
        .bind(&self.locale)
        .bind(self.storage_quota_bytes)
        .bind(self.notifications_enabled)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Imported)
    }
}

/// Update-on-conflict keyed by (user, path).
#[async_trait]
impl RestoreRow for FileMetadataRow {
    const TABLE: &'static str = "file_metadata";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        sqlx::query(
            "INSERT INTO file_metadata (user_id, path, category, size_bytes, mime_type, starred, modified_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (user_id, path) DO UPDATE SET \
               category = excluded.category, \
               size_bytes = excluded.size_bytes, \
               mime_type = excluded.mime_type, \
               starred = excluded.starred, \
               modified_at = excluded.modified_at",
        )
        .bind(user_id)
        .bind(&self.path)
        .bind(&self.category)
        .bind(self.size_bytes)
        .bind(&self.mime_type)
        .bind(self.starred)
        .bind(&self.modified_at)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Imported)
    }
}

/// Update-on-conflict keyed by (user, path), refreshing only the access
/// timestamp.
#[async_trait]
impl RestoreRow for RecentFileRow {
    const TABLE: &'static str = "recent_files";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        sqlx::query(
            "INSERT INTO recent_files (user_id, path, accessed_at) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT (user_id, path) DO UPDATE SET \
               accessed_at = excluded.accessed_at",
        )
        .bind(user_id)
        .bind(&self.path)
        .bind(&self.accessed_at)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Imported)
    }
}

/// Insert, ignore-on-conflict: an app already connected on the importing
/// host keeps its existing configuration (and any live credentials).
#[async_trait]
impl RestoreRow for ConnectedAppRow {
    const TABLE: &'static str = "connected_apps";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO connected_apps (user_id, provider, display_name, scopes) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(&self.provider)
        .bind(&self.display_name)
        .bind(&self.scopes)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            Ok(RowOutcome::Skipped("already connected"))
        } else {
            Ok(RowOutcome::Imported)
        }
    }
}

/// Pure append; duplicates across repeated imports are tolerated.
#[async_trait]
impl RestoreRow for ActivityRow {
    const TABLE: &'static str = "activity_log";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        sqlx::query(
            "INSERT INTO activity_log (user_id, action, detail, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(&self.action)
        .bind(&self.detail)
        .bind(&self.created_at)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Imported)
    }
}

/// Pure append; duplicates across repeated imports are tolerated.
#[async_trait]
impl RestoreRow for NotificationRow {
    const TABLE: &'static str = "notifications";

    async fn restore(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> sqlx::Result<RowOutcome> {
        sqlx::query(
            "INSERT INTO notifications (user_id, kind, body, is_read, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(&self.kind)
        .bind(&self.body)
        .bind(self.is_read)
        .bind(&self.created_at)
        .execute(conn)
        .await?;
        Ok(RowOutcome::Imported)
    }
}

/// True for duplicate-key failures that the per-row policy skips.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
