//! Reads and writes the three package artifacts as JSON documents.
//!
//! There is no cross-file transactionality: the package is atomic only in
//! the filesystem sense, so the export pipeline writes the manifest last.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{package_root, TransferManifest, ACCOUNT_FILE, DATABASE_FILE, FILES_DIR, MANIFEST_FILE};
use crate::account::AccountSnapshot;
use crate::categories::Category;
use crate::common::errors::{Result, TransferError};
use crate::store::rows::RelationalDump;

/// Codec bound to one package root on a candidate volume.
pub struct PackageCodec {
    root: PathBuf,
}

impl PackageCodec {
    pub fn new(mount: &Path) -> Self {
        Self {
            root: package_root(mount),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.files_dir().join(category.dir_name())
    }

    /// Create the package root. Export side only.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub async fn write_manifest(&self, manifest: &TransferManifest) -> Result<()> {
        self.write_json(MANIFEST_FILE, manifest).await
    }

    pub async fn write_account_snapshot(&self, snapshot: &AccountSnapshot) -> Result<()> {
        self.write_json(ACCOUNT_FILE, snapshot).await
    }

    pub async fn write_relational_dump(&self, dump: &RelationalDump) -> Result<()> {
        self.write_json(DATABASE_FILE, dump).await
    }

    /// Read and parse the manifest. A missing file means "no package here";
    /// an unparseable one means the package cannot be trusted.
    pub async fn read_manifest(&self) -> Result<TransferManifest> {
        let path = self.root.join(MANIFEST_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(TransferError::PackageMissing(self.root.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&data)
            .map_err(|err| TransferError::PackageCorrupt(format!("{MANIFEST_FILE}: {err}")))
    }

    /// Read the account snapshot. Missing after a valid manifest means the
    /// package is incomplete, a hard error for import.
    pub async fn read_account_snapshot(&self) -> Result<AccountSnapshot> {
        self.read_required(ACCOUNT_FILE).await
    }

    pub async fn read_relational_dump(&self) -> Result<RelationalDump> {
        self.read_required(DATABASE_FILE).await
    }

    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.root.join(name), data).await?;
        Ok(())
    }

    async fn read_required<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.root.join(name);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(TransferError::PackageIncomplete(format!("{name} is missing")));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&data)
            .map_err(|err| TransferError::PackageCorrupt(format!("{name}: {err}")))
    }
}
