#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use duffel::common::config::DuffelConfig;
use duffel::common::progress::TransferProgress;
use duffel::store::Store;
use duffel::TransferService;

pub async fn memory_store() -> Store {
    Store::connect_in_memory().await.expect("in-memory store")
}

pub fn config_for(data_dir: &Path) -> DuffelConfig {
    DuffelConfig {
        data_dir: data_dir.to_path_buf(),
        ..DuffelConfig::default()
    }
}

/// Seed the source account: one user, one settings row, and rows in every
/// transfer-covered table.
pub async fn seed_account(store: &Store, email: &str) -> i64 {
    let user_id = store
        .upsert_user(
            &duffel::account::ProfileSnapshot {
                email: email.to_string(),
                display_name: "Pat Doe".to_string(),
                avatar: Some("avatars/pat.png".to_string()),
            },
            "source-host-hash",
        )
        .await
        .expect("seed user");

    sqlx::query(
        "INSERT INTO settings (user_id, theme, locale, storage_quota_bytes, notifications_enabled) \
         VALUES (?1, 'dark', 'en', 1073741824, 1)",
    )
    .bind(user_id)
    .execute(store.pool())
    .await
    .expect("seed settings");

    for (path, category, size) in [
        ("files/report.txt", "files", 70),
        ("photos/trip.jpg", "photos", 50),
    ] {
        sqlx::query(
            "INSERT INTO file_metadata (user_id, path, category, size_bytes, modified_at) \
             VALUES (?1, ?2, ?3, ?4, '2026-08-01T10:00:00Z')",
        )
        .bind(user_id)
        .bind(path)
        .bind(category)
        .bind(size)
        .execute(store.pool())
        .await
        .expect("seed file metadata");

        sqlx::query(
            "INSERT INTO recent_files (user_id, path, accessed_at) \
             VALUES (?1, ?2, '2026-08-02T09:00:00Z')",
        )
        .bind(user_id)
        .bind(path)
        .execute(store.pool())
        .await
        .expect("seed recent file");
    }

    sqlx::query(
        "INSERT INTO connected_apps (user_id, provider, display_name, scopes, access_token) \
         VALUES (?1, 'calendar', 'Calendar Sync', 'read', 'secret-token')",
    )
    .bind(user_id)
    .execute(store.pool())
    .await
    .expect("seed connected app");

    for n in 0..2 {
        sqlx::query(
            "INSERT INTO activity_log (user_id, action, detail, created_at) \
             VALUES (?1, 'upload', ?2, '2026-08-03T12:00:00Z')",
        )
        .bind(user_id)
        .bind(format!("file-{n}"))
        .execute(store.pool())
        .await
        .expect("seed activity");

        sqlx::query(
            "INSERT INTO notifications (user_id, kind, body, is_read, created_at) \
             VALUES (?1, 'share', ?2, 0, '2026-08-03T12:00:00Z')",
        )
        .bind(user_id)
        .bind(format!("notification {n}"))
        .execute(store.pool())
        .await
        .expect("seed notification");
    }

    user_id
}

/// Small fixture tree: 2 files in "general", 1 in "photos", 150 bytes total.
pub fn write_scenario_tree(data_dir: &Path) {
    fs::create_dir_all(data_dir.join("files/docs")).expect("create files dir");
    fs::create_dir_all(data_dir.join("photos")).expect("create photos dir");
    fs::write(data_dir.join("files/report.txt"), vec![b'a'; 70]).expect("write report");
    fs::write(data_dir.join("files/docs/notes.md"), vec![b'b'; 30]).expect("write notes");
    fs::write(data_dir.join("photos/trip.jpg"), vec![b'c'; 50]).expect("write photo");
}

/// Poll until the current run reaches `done` or `error`.
pub async fn wait_terminal(service: &TransferService) -> TransferProgress {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let progress = service.progress();
            if progress.is_terminal() {
                return progress;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("transfer never reached a terminal phase")
}

pub async fn table_count(store: &Store, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("count rows")
}
