//! Progress data types shared by the tracker and polling consumers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::account::UserProfile;
use crate::categories::Category;

/// Phase tag of the current (or most recently completed) run.
///
/// `Done` and `Error` are terminal: the pipeline takes no further action
/// until a new run resets the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferPhase {
    Idle,
    ExportingDb,
    CopyingFiles,
    WritingManifest,
    ImportingAccount,
    ImportingDb,
    ImportingFiles,
    Done,
    Error,
}

impl TransferPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferPhase::Done | TransferPhase::Error)
    }
}

/// Per-category file counters. Owned by the tracker for the duration of one
/// run and reset at the start of every export or import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub category: Category,
    pub files_copied: u64,
    pub files_total: u64,
    pub bytes_copied: u64,
    pub complete: bool,
}

impl CategoryProgress {
    pub fn new(category: Category, files_total: u64) -> Self {
        Self {
            category,
            files_copied: 0,
            files_total,
            bytes_copied: 0,
            complete: false,
        }
    }
}

/// Per-table row counters during a relational restore.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProgress {
    pub table: String,
    pub imported: u64,
    pub skipped: u64,
    pub failed: u64,
    pub total: u64,
}

impl TableProgress {
    pub fn new(table: &str, total: u64) -> Self {
        Self {
            table: table.to_string(),
            imported: 0,
            skipped: 0,
            failed: 0,
            total,
        }
    }
}

/// Snapshot of the single in-flight (or last finished) run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub phase: TransferPhase,
    pub percent: f64,
    pub message: String,
    pub files_copied: u64,
    pub files_total: u64,
    pub bytes_copied: u64,
    pub categories: Vec<CategoryProgress>,
    pub tables: Vec<TableProgress>,
    /// Bytes per second over the most recent sampling window.
    pub throughput_bps: Option<f64>,
    pub eta_seconds: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    /// Touched on every mutation; a watchdog can use it as a liveness signal.
    pub updated_at: Option<DateTime<Utc>>,
    /// Set on successful import only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self {
            phase: TransferPhase::Idle,
            percent: 0.0,
            message: String::new(),
            files_copied: 0,
            files_total: 0,
            bytes_copied: 0,
            categories: Vec::new(),
            tables: Vec::new(),
            throughput_bps: None,
            eta_seconds: None,
            started_at: None,
            updated_at: None,
            session_token: None,
            user: None,
        }
    }
}

impl TransferProgress {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_serialize_kebab_case() {
        let json = serde_json::to_string(&TransferPhase::ImportingDb).unwrap();
        assert_eq!(json, "\"importing-db\"");
        let json = serde_json::to_string(&TransferPhase::ExportingDb).unwrap();
        assert_eq!(json, "\"exporting-db\"");
    }

    #[test]
    fn default_snapshot_is_idle_at_zero() {
        let progress = TransferProgress::default();
        assert_eq!(progress.phase, TransferPhase::Idle);
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_terminal());
    }

    #[test]
    fn done_and_error_are_terminal() {
        assert!(TransferPhase::Done.is_terminal());
        assert!(TransferPhase::Error.is_terminal());
        assert!(!TransferPhase::CopyingFiles.is_terminal());
    }
}
