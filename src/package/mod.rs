//! Package layout on the external volume.
//!
//! ```text
//! <mount>/duffel-package/
//!   manifest.json
//!   account.json
//!   database.json
//!   files/<category>/...
//! ```

pub mod codec;
pub mod detect;
pub mod manifest;

use std::path::{Path, PathBuf};

/// Well-known package subdirectory name on the volume.
pub const PACKAGE_DIR: &str = "duffel-package";
/// Producing application identifier checked during detection.
pub const APPLICATION_ID: &str = "duffel";
/// Package format version.
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ACCOUNT_FILE: &str = "account.json";
pub const DATABASE_FILE: &str = "database.json";
pub const FILES_DIR: &str = "files";

pub use codec::PackageCodec;
pub use detect::detect;
pub use manifest::TransferManifest;

pub fn package_root(mount: &Path) -> PathBuf {
    mount.join(PACKAGE_DIR)
}
