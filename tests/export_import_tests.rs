mod common;

use std::fs;

use common::{config_for, memory_store, seed_account, wait_terminal, write_scenario_tree};
use duffel::{TransferPhase, TransferService};

/// Full round trip: 3 files (2 general, 1 photos, 150 bytes) and one
/// settings row, exported and then imported into an empty store on a
/// "new host".
#[tokio::test]
async fn export_then_import_reconstructs_the_account() {
    let tmp = tempfile::tempdir().unwrap();
    let source_data = tmp.path().join("source-data");
    let mount = tmp.path().join("mount");
    fs::create_dir_all(&mount).unwrap();
    write_scenario_tree(&source_data);

    let source_store = memory_store().await;
    seed_account(&source_store, "pat@example.com").await;

    let exporter = TransferService::new(source_store, config_for(&source_data));
    exporter.start_export(mount.clone()).unwrap();
    let progress = wait_terminal(&exporter).await;
    assert_eq!(progress.phase, TransferPhase::Done);
    assert_eq!(progress.percent, 100.0);
    assert_eq!(progress.files_copied, 3);
    assert_eq!(progress.bytes_copied, 150);

    let manifest = exporter.detect(&mount).await.expect("package detected");
    assert_eq!(manifest.total_files, 3);
    assert_eq!(manifest.bytes_written, 150);
    assert_eq!(manifest.user_email, "pat@example.com");

    // Import on the new host.
    let target_data = tmp.path().join("target-data");
    let target_store = memory_store().await;
    let importer = TransferService::new(target_store.clone(), config_for(&target_data));
    importer
        .start_import(mount.clone(), "brand-new-password".to_string())
        .unwrap();
    let progress = wait_terminal(&importer).await;
    assert_eq!(progress.phase, TransferPhase::Done, "{}", progress.message);
    assert_eq!(progress.percent, 100.0);

    // Exactly one settings row and a session for the exported email.
    let settings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(target_store.pool())
        .await
        .unwrap();
    assert_eq!(settings, 1);

    let token = progress.session_token.expect("session token attached");
    assert!(!token.is_empty());
    let user = progress.user.expect("public user attached");
    assert_eq!(user.email, "pat@example.com");

    // File trees are byte-identical, split 2/1 across the same categories.
    for relative in ["files/report.txt", "files/docs/notes.md", "photos/trip.jpg"] {
        let source = fs::read(source_data.join(relative)).unwrap();
        let restored = fs::read(target_data.join(relative)).unwrap();
        assert_eq!(source, restored, "mismatch for {relative}");
    }
}

#[tokio::test]
async fn export_to_missing_volume_ends_in_error_phase() {
    let tmp = tempfile::tempdir().unwrap();
    let store = memory_store().await;
    seed_account(&store, "pat@example.com").await;

    let service = TransferService::new(store, config_for(&tmp.path().join("data")));
    service
        .start_export(tmp.path().join("never-mounted"))
        .unwrap();

    let progress = wait_terminal(&service).await;
    assert_eq!(progress.phase, TransferPhase::Error);
    assert!(progress.message.contains("volume"), "{}", progress.message);
}

#[tokio::test]
async fn export_with_empty_store_ends_in_error_phase() {
    let tmp = tempfile::tempdir().unwrap();
    let mount = tmp.path().join("mount");
    fs::create_dir_all(&mount).unwrap();

    let service = TransferService::new(memory_store().await, config_for(&tmp.path().join("data")));
    service.start_export(mount).unwrap();

    let progress = wait_terminal(&service).await;
    assert_eq!(progress.phase, TransferPhase::Error);
    assert!(progress.message.contains("no account"), "{}", progress.message);
}

#[tokio::test]
async fn percent_is_monotonic_and_resets_between_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let mount = tmp.path().join("mount");
    fs::create_dir_all(&mount).unwrap();
    write_scenario_tree(&data);

    let store = memory_store().await;
    seed_account(&store, "pat@example.com").await;
    let service = TransferService::new(store, config_for(&data));

    service.start_export(mount.clone()).unwrap();
    let mut last = service.progress().percent;
    loop {
        let progress = service.progress();
        assert!(
            progress.percent >= last,
            "percent regressed from {last} to {}",
            progress.percent
        );
        last = progress.percent;
        if progress.is_terminal() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    assert_eq!(service.progress().percent, 100.0);

    // Starting the next run resets the snapshot before the pipeline runs.
    service.start_export(mount).unwrap();
    assert_eq!(service.progress().percent, 0.0);
    wait_terminal(&service).await;
}
