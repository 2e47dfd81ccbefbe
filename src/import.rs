//! Import pipeline: manifest validation, account materialization, per-table
//! relational restore, file mirroring, session bootstrap.
//!
//! States run strictly sequentially; `error` absorbs from any step. The
//! whole pipeline is re-runnable: every table restore is an upsert or a
//! tolerated append, and file mirroring overwrites in place.

use std::path::Path;
use std::sync::Arc;

use sqlx::{Sqlite, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::account;
use crate::account::session::SessionIssuer;
use crate::categories::{copy_tree, count_files, Category};
use crate::common::config::DuffelConfig;
use crate::common::errors::{Result, TransferError};
use crate::common::progress::TransferPhase;
use crate::package::{detect, PackageCodec};
use crate::service::tracker::ProgressTracker;
use crate::store::restore::{is_unique_violation, RestoreRow};
use crate::store::rows::{RelationalDump, RowOutcome};
use crate::store::Store;

/// Stream row counts to the tracker at this granularity so long imports
/// stay observable.
const ROW_REPORT_INTERVAL: u64 = 20;

/// Run one full import from the package at `mount`.
pub async fn run(
    store: &Store,
    config: &DuffelConfig,
    mount: &Path,
    new_password: &str,
    tracker: &ProgressTracker,
    sessions: &Arc<dyn SessionIssuer>,
    cancel: &CancellationToken,
) -> Result<()> {
    // Validation: nothing is mutated until the manifest checks out and both
    // artifacts parse.
    let manifest = detect::require(mount).await?;
    info!(
        mount = %mount.display(),
        source = %manifest.source_hostname,
        email = %manifest.user_email,
        "importing transfer package"
    );
    let codec = PackageCodec::new(mount);

    tracker.set_phase(TransferPhase::ImportingAccount, "Restoring account");
    let snapshot = codec.read_account_snapshot().await?;
    let dump = codec.read_relational_dump().await?;

    // The caller-supplied password is the only one this pipeline writes;
    // the source host's hash never traveled in the package.
    let password_hash = account::hash_password(new_password)?;
    let user_id = store.upsert_user(&snapshot.user, &password_hash).await?;
    let user = store.user_by_id(user_id).await?;
    tracker.set_percent(10.0);

    tracker.set_phase(TransferPhase::ImportingDb, "Restoring database");
    tracker.seed_tables(&dump.table_totals());
    restore_dump(store, user_id, &dump, tracker, cancel).await?;
    tracker.set_percent(40.0);

    // Fresh totals from the package contents: the package, not the
    // export-time manifest numbers, is the source of truth now.
    tracker.set_phase(TransferPhase::ImportingFiles, "Restoring files");
    let totals: Vec<(Category, u64)> = Category::ALL
        .iter()
        .map(|category| (*category, count_files(&codec.category_dir(*category))))
        .collect();
    tracker.seed_categories(&totals);
    tracker.begin_copy_band(40.0, 100.0);

    for category in Category::ALL {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        copy_tree(
            &codec.category_dir(category),
            &config.category_dir(category),
            category,
            tracker,
        )
        .await;
        tracker.mark_category_complete(category);
    }

    // Session bootstrap. Failing to issue a session never downgrades a
    // successful restore.
    match sessions.issue(&user).await {
        Ok(session) => tracker.attach_session(session),
        Err(err) => error!(error = %err, "session bootstrap failed after import"),
    }

    tracker.finish("Import complete");
    let (files, bytes) = tracker.copy_totals();
    info!(files, bytes, rows = dump.total_rows(), "import finished");
    Ok(())
}

/// Restore every table inside one transaction. Per-row conflicts are
/// resolved by each table's policy and never abort the batch; the commit
/// happens once, after every table has been attempted.
async fn restore_dump(
    store: &Store,
    user_id: i64,
    dump: &RelationalDump,
    tracker: &ProgressTracker,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut tx = store.pool().begin().await?;

    restore_table(&mut tx, user_id, &dump.settings, tracker, cancel).await?;
    restore_table(&mut tx, user_id, &dump.file_metadata, tracker, cancel).await?;
    restore_table(&mut tx, user_id, &dump.recent_files, tracker, cancel).await?;
    restore_table(&mut tx, user_id, &dump.connected_apps, tracker, cancel).await?;
    restore_table(&mut tx, user_id, &dump.activity_log, tracker, cancel).await?;
    restore_table(&mut tx, user_id, &dump.notifications, tracker, cancel).await?;

    tx.commit().await?;
    Ok(())
}

async fn restore_table<R: RestoreRow + Sync>(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    rows: &[R],
    tracker: &ProgressTracker,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut imported: u64 = 0;
    let mut skipped: u64 = 0;
    let mut failed: u64 = 0;

    for (index, row) in rows.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let outcome = match row.restore(&mut **tx, user_id).await {
            Ok(outcome) => outcome,
            Err(err) if is_unique_violation(&err) => RowOutcome::Skipped("duplicate key"),
            Err(err) => RowOutcome::Failed(err),
        };
        match outcome {
            RowOutcome::Imported => imported += 1,
            RowOutcome::Skipped(reason) => {
                skipped += 1;
                debug!(table = R::TABLE, reason, "skipped row");
            }
            RowOutcome::Failed(err) => {
                failed += 1;
                warn!(table = R::TABLE, error = %err, "row restore failed, continuing");
            }
        }

        let attempted = index as u64 + 1;
        if attempted % ROW_REPORT_INTERVAL == 0 {
            tracker.set_table(R::TABLE, imported, skipped, failed);
        }
    }

    tracker.set_table(R::TABLE, imported, skipped, failed);
    if skipped > 0 || failed > 0 {
        info!(
            table = R::TABLE,
            imported, skipped, failed, "table restored with conflicts"
        );
    }
    Ok(())
}
