//! Non-mutating package detection.

use std::path::Path;

use tracing::{debug, warn};

use super::{PackageCodec, TransferManifest};
use crate::common::errors::{Result, TransferError};

/// Scan a candidate mount for a well-formed package.
///
/// Returns the parsed manifest, or `None` for "no package here". Never
/// creates or modifies anything on the candidate volume.
pub async fn detect(mount: &Path) -> Option<TransferManifest> {
    let codec = PackageCodec::new(mount);
    match codec.read_manifest().await {
        Ok(manifest) if manifest.is_compatible() => {
            debug!(
                mount = %mount.display(),
                source = %manifest.source_hostname,
                "detected transfer package"
            );
            Some(manifest)
        }
        Ok(manifest) => {
            warn!(
                mount = %mount.display(),
                application = %manifest.application,
                version = manifest.version,
                "ignoring package from unrecognized application"
            );
            None
        }
        Err(TransferError::PackageMissing(_)) => None,
        Err(err) => {
            debug!(mount = %mount.display(), error = %err, "candidate volume has no readable package");
            None
        }
    }
}

/// Import precondition: like [`detect`], but failures are hard errors so no
/// database or file mutation happens against an untrusted package.
pub async fn require(mount: &Path) -> Result<TransferManifest> {
    let manifest = PackageCodec::new(mount).read_manifest().await?;
    if !manifest.is_compatible() {
        return Err(TransferError::PackageCorrupt(format!(
            "unrecognized application identifier '{}'",
            manifest.application
        )));
    }
    Ok(manifest)
}
