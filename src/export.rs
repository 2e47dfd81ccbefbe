//! Export pipeline: relational dump, account extraction, categorized file
//! mirroring, manifest finalization.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::account::{AccountSnapshot, ProfileSnapshot};
use crate::categories::{copy_tree, count_files, Category};
use crate::common::config::DuffelConfig;
use crate::common::errors::{Result, TransferError};
use crate::common::progress::TransferPhase;
use crate::package::{PackageCodec, TransferManifest};
use crate::service::tracker::ProgressTracker;
use crate::store::Store;

const PROBE_FILE: &str = ".duffel-write-probe";

/// Run one full export onto the volume at `mount`.
///
/// Any error leaves partially written package artifacts in place; without a
/// manifest the package is treated as absent by detection and import.
pub async fn run(
    store: &Store,
    config: &DuffelConfig,
    mount: &Path,
    tracker: &ProgressTracker,
    cancel: &CancellationToken,
) -> Result<()> {
    probe_volume(mount).await?;
    let codec = PackageCodec::new(mount);
    codec.prepare().await?;

    // Phase 1: one read-only pass over every table, plus the account
    // snapshot derived from the active user and its settings row.
    tracker.set_phase(TransferPhase::ExportingDb, "Reading database");
    let user = store.active_user().await?;
    let dump = store.dump_for_user(user.id).await?;
    let snapshot = AccountSnapshot {
        user: ProfileSnapshot::from(&user),
        settings: dump.settings.first().cloned(),
    };
    codec.write_relational_dump(&dump).await?;
    codec.write_account_snapshot(&snapshot).await?;
    tracker.set_percent(20.0);

    // Phase 2: count first so the global denominator is accurate, then
    // mirror each category sequentially.
    tracker.set_phase(TransferPhase::CopyingFiles, "Copying files");
    let totals: Vec<(Category, u64)> = Category::ALL
        .iter()
        .map(|category| {
            (
                *category,
                count_files(&config.category_dir(*category)),
            )
        })
        .collect();
    tracker.seed_categories(&totals);
    tracker.begin_copy_band(20.0, 90.0);

    for category in Category::ALL {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        copy_tree(
            &config.category_dir(category),
            &codec.category_dir(category),
            category,
            tracker,
        )
        .await;
        tracker.mark_category_complete(category);
    }
    tracker.set_percent(90.0);

    // Phase 3: aggregate totals from the run, manifest written last.
    tracker.set_phase(TransferPhase::WritingManifest, "Writing manifest");
    let (total_files, bytes_written) = tracker.copy_totals();
    let manifest = TransferManifest::new(
        total_files,
        bytes_written,
        &config.data_dir,
        &user.display_name,
        &user.email,
    );
    codec.write_manifest(&manifest).await?;

    tracker.finish("Export complete");
    info!(
        mount = %mount.display(),
        files = total_files,
        bytes = bytes_written,
        rows = dump.total_rows(),
        "export finished"
    );
    Ok(())
}

/// Fail fast, before any mutation, when the volume is absent or read-only.
async fn probe_volume(mount: &Path) -> Result<()> {
    if !tokio::fs::try_exists(mount).await.unwrap_or(false) {
        return Err(TransferError::VolumeMissing(mount.to_path_buf()));
    }

    let probe = mount.join(PROBE_FILE);
    if tokio::fs::write(&probe, b"probe").await.is_err() {
        return Err(TransferError::VolumeNotWritable(mount.to_path_buf()));
    }
    if tokio::fs::remove_file(&probe).await.is_err() {
        return Err(TransferError::VolumeNotWritable(mount.to_path_buf()));
    }
    Ok(())
}
