//! Typed row models for the relational dump.
//!
//! Each table the transfer covers gets its own row struct, so per-table
//! conflict policy is compile-time-checked instead of stringly-typed. The
//! owning-user reference in every row is rewritten at import time; the
//! `user_id` carried in the dump is the source host's id and only kept for
//! debugging.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub setup_complete: bool,
    pub email_verified: bool,
    pub created_at: String,
}

/// Singleton per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettingsRow {
    pub user_id: i64,
    pub theme: String,
    pub locale: String,
    pub storage_quota_bytes: i64,
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileMetadataRow {
    pub user_id: i64,
    pub path: String,
    pub category: String,
    pub size_bytes: i64,
    pub mime_type: Option<String>,
    pub starred: bool,
    pub modified_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecentFileRow {
    pub user_id: i64,
    pub path: String,
    pub accessed_at: String,
}

/// Connected third-party app configuration. Credentials are stripped at dump
/// time: the row shape has no token column, and import leaves it NULL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectedAppRow {
    pub user_id: i64,
    pub provider: String,
    pub display_name: String,
    pub scopes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub user_id: i64,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub user_id: i64,
    pub kind: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Full relational dump: serde field names are the table names, giving the
/// `database.json` mapping from table name to ordered row list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalDump {
    pub settings: Vec<SettingsRow>,
    pub file_metadata: Vec<FileMetadataRow>,
    pub recent_files: Vec<RecentFileRow>,
    pub connected_apps: Vec<ConnectedAppRow>,
    pub activity_log: Vec<ActivityRow>,
    pub notifications: Vec<NotificationRow>,
}

impl RelationalDump {
    /// (table name, row count) pairs in restore order.
    pub fn table_totals(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("settings", self.settings.len() as u64),
            ("file_metadata", self.file_metadata.len() as u64),
            ("recent_files", self.recent_files.len() as u64),
            ("connected_apps", self.connected_apps.len() as u64),
            ("activity_log", self.activity_log.len() as u64),
            ("notifications", self.notifications.len() as u64),
        ]
    }

    pub fn total_rows(&self) -> u64 {
        self.table_totals().iter().map(|(_, n)| n).sum()
    }
}

/// Typed result of restoring one row, aggregated into per-table progress so
/// skip reasons are inspectable instead of silently discarded.
#[derive(Debug)]
pub enum RowOutcome {
    Imported,
    Skipped(&'static str),
    Failed(sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_serializes_table_names_as_keys() {
        let dump = RelationalDump::default();
        let value = serde_json::to_value(&dump).unwrap();

        for (table, _) in dump.table_totals() {
            assert!(value.get(table).is_some(), "missing table key {table}");
        }
    }

    #[test]
    fn partial_dump_parses_with_defaults() {
        let dump: RelationalDump =
            serde_json::from_str(r#"{"settings": [], "notifications": []}"#).unwrap();
        assert_eq!(dump.total_rows(), 0);
        assert!(dump.file_metadata.is_empty());
    }
}
