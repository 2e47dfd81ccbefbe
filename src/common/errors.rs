//! Error taxonomy for the transfer core.
//!
//! Precondition errors (volume, package) are reported before any mutation.
//! Per-file copy failures and per-row conflicts are handled where they occur
//! and never surface here; everything else aborts the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Another export or import is already in flight.
    #[error("a transfer is already in progress")]
    Busy,

    #[error("volume not found: {}", .0.display())]
    VolumeMissing(PathBuf),

    /// The volume exists but the write probe failed. Reported distinctly
    /// from generic I/O so the caller can suggest remounting read-write.
    #[error("volume is not writable: {}", .0.display())]
    VolumeNotWritable(PathBuf),

    #[error("no transfer package found at {}", .0.display())]
    PackageMissing(PathBuf),

    #[error("package is corrupt: {0}")]
    PackageCorrupt(String),

    #[error("package incomplete: {0}")]
    PackageIncomplete(String),

    #[error("no account found to export")]
    UserMissing,

    #[error("transfer cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("package artifact is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("session issuance failed: {0}")]
    Session(String),
}
