mod common;

use std::fs;

use common::{config_for, memory_store, table_count, wait_terminal};
use duffel::{TransferPhase, TransferService};

#[tokio::test]
async fn detect_on_empty_volume_returns_none_without_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let service = TransferService::new(memory_store().await, config_for(&tmp.path().join("data")));

    assert!(service.detect(tmp.path()).await.is_none());

    let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
    assert!(entries.is_empty(), "detection must not create files");
}

#[tokio::test]
async fn manifest_less_package_dir_is_not_a_package() {
    let tmp = tempfile::tempdir().unwrap();
    let package = tmp.path().join("duffel-package");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("account.json"), b"{}").unwrap();

    let service = TransferService::new(memory_store().await, config_for(&tmp.path().join("data")));
    assert!(service.detect(tmp.path()).await.is_none());
}

/// A package whose manifest names a different application is rejected before
/// any database or file mutation occurs.
#[tokio::test]
async fn foreign_package_import_is_rejected_before_mutation() {
    let tmp = tempfile::tempdir().unwrap();
    let package = tmp.path().join("duffel-package");
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("manifest.json"),
        serde_json::json!({
            "version": 1,
            "application": "rival-product",
            "createdAt": "2026-08-01T00:00:00Z",
            "sourceHostname": "elsewhere",
            "sourcePlatform": "linux",
            "sourceArch": "x86_64",
            "totalFiles": 0,
            "bytesWritten": 0,
            "dataDir": "/srv/data",
            "userName": "Mallory",
            "userEmail": "mallory@example.com"
        })
        .to_string(),
    )
    .unwrap();
    fs::write(package.join("account.json"), b"{}").unwrap();
    fs::write(package.join("database.json"), b"{}").unwrap();

    let data_dir = tmp.path().join("data");
    let store = memory_store().await;
    let service = TransferService::new(store.clone(), config_for(&data_dir));

    assert!(service.detect(tmp.path()).await.is_none());

    service
        .start_import(tmp.path().to_path_buf(), "password".to_string())
        .unwrap();
    let progress = wait_terminal(&service).await;
    assert_eq!(progress.phase, TransferPhase::Error);

    assert_eq!(table_count(&store, "users").await, 0);
    assert!(!data_dir.exists(), "import must not touch the data dir");
}

#[tokio::test]
async fn package_without_relational_dump_is_incomplete() {
    let tmp = tempfile::tempdir().unwrap();
    let package = tmp.path().join("duffel-package");
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("manifest.json"),
        serde_json::json!({
            "version": 1,
            "application": "duffel",
            "createdAt": "2026-08-01T00:00:00Z",
            "sourceHostname": "old-laptop",
            "sourcePlatform": "linux",
            "sourceArch": "x86_64",
            "totalFiles": 0,
            "bytesWritten": 0,
            "dataDir": "/srv/data",
            "userName": "Pat",
            "userEmail": "pat@example.com"
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        package.join("account.json"),
        serde_json::json!({
            "user": { "email": "pat@example.com", "display_name": "Pat", "avatar": null }
        })
        .to_string(),
    )
    .unwrap();

    let service = TransferService::new(memory_store().await, config_for(&tmp.path().join("data")));
    assert!(service.detect(tmp.path()).await.is_some(), "manifest itself is valid");

    service
        .start_import(tmp.path().to_path_buf(), "password".to_string())
        .unwrap();
    let progress = wait_terminal(&service).await;
    assert_eq!(progress.phase, TransferPhase::Error);
    assert!(
        progress.message.contains("incomplete"),
        "{}",
        progress.message
    );
}
