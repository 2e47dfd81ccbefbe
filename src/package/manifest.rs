//! Transfer manifest model.
//!
//! Written once, last, at the end of an export; a half-written package is
//! therefore never mistaken for a complete one. The file/byte totals are
//! advisory: live progress counters are authoritative during a run, and the
//! package contents are the source of truth at import time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{APPLICATION_ID, FORMAT_VERSION};

/// Summary record identifying and describing a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferManifest {
    pub version: u32,
    pub application: String,
    pub created_at: DateTime<Utc>,
    pub source_hostname: String,
    pub source_platform: String,
    pub source_arch: String,
    pub total_files: u64,
    pub bytes_written: u64,
    /// Live data-directory path on the source host.
    pub data_dir: String,
    /// Denormalized for quick display without parsing the full dump.
    pub user_name: String,
    pub user_email: String,
}

impl TransferManifest {
    pub fn new(
        total_files: u64,
        bytes_written: u64,
        data_dir: &Path,
        user_name: &str,
        user_email: &str,
    ) -> Self {
        let source_hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            version: FORMAT_VERSION,
            application: APPLICATION_ID.to_string(),
            created_at: Utc::now(),
            source_hostname,
            source_platform: std::env::consts::OS.to_string(),
            source_arch: std::env::consts::ARCH.to_string(),
            total_files,
            bytes_written,
            data_dir: data_dir.display().to_string(),
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
        }
    }

    /// True when the application identifier matches and a usable version is
    /// present. Detection trusts nothing else about a package before this.
    pub fn is_compatible(&self) -> bool {
        self.application == APPLICATION_ID && self.version >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_wire_keys() {
        let manifest = TransferManifest::new(3, 150, Path::new("/srv/data"), "Pat", "pat@example.com");
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["application"], "duffel");
        assert_eq!(value["totalFiles"], 3);
        assert_eq!(value["bytesWritten"], 150);
        assert_eq!(value["userEmail"], "pat@example.com");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("sourceHostname").is_some());
    }

    #[test]
    fn foreign_application_is_incompatible() {
        let mut manifest =
            TransferManifest::new(0, 0, Path::new("/srv/data"), "Pat", "pat@example.com");
        assert!(manifest.is_compatible());

        manifest.application = "someone-else".to_string();
        assert!(!manifest.is_compatible());
    }

    #[test]
    fn zero_version_is_incompatible() {
        let mut manifest =
            TransferManifest::new(0, 0, Path::new("/srv/data"), "Pat", "pat@example.com");
        manifest.version = 0;
        assert!(!manifest.is_compatible());
    }
}
