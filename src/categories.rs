//! Logical data categories and the directory primitives shared by the export
//! and import pipelines.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::service::tracker::ProgressTracker;

/// Fixed set of logical partitions of user file data, each mapped to one
/// physical subdirectory of the data dir (and of a package's `files/` dir).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    General,
    Photos,
    Videos,
    Music,
    Shared,
    DatabaseMeta,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::Photos,
        Category::Videos,
        Category::Music,
        Category::Shared,
        Category::DatabaseMeta,
    ];

    /// Physical subdirectory name for this category.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::General => "files",
            Category::Photos => "photos",
            Category::Videos => "videos",
            Category::Music => "music",
            Category::Shared => "shared",
            Category::DatabaseMeta => "db-meta",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Depth-first count of plain files under `dir`.
///
/// Unreadable directories are skipped rather than failing; a missing `dir`
/// counts as zero.
pub fn count_files(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count() as u64
}

/// Depth-first mirror copy of `src` into `dest`, reporting each completed
/// file to the tracker under `category`.
///
/// At-least-effort semantics: failures on individual entries are logged and
/// skipped, never aborting the category. A missing `src` is a no-op.
pub async fn copy_tree(src: &Path, dest: &Path, category: Category, tracker: &ProgressTracker) {
    if !src.is_dir() {
        return;
    }

    let walker = WalkDir::new(src).into_iter().filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!(%category, error = %err, "skipping unreadable entry");
            None
        }
    });

    for entry in walker {
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            if let Err(err) = tokio::fs::create_dir_all(&target).await {
                warn!(%category, path = %target.display(), error = %err, "failed to create directory");
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(parent) = target.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!(%category, path = %parent.display(), error = %err, "failed to create parent directory");
                continue;
            }
        }

        match tokio::fs::copy(entry.path(), &target).await {
            Ok(bytes) => {
                let name = entry.file_name().to_string_lossy();
                tracker.file_copied(category, &name, bytes);
            }
            Err(err) => {
                warn!(
                    %category,
                    path = %entry.path().display(),
                    error = %err,
                    "failed to copy file, skipping"
                );
            }
        }
    }
}
