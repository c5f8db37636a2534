//! Snapshot persistence and recovery.

use std::fs;

use ntest::timeout;
use tempfile::tempdir;

use catalog_core::coordinator::FieldPatch;
use catalog_core::store::{CatalogStore, MemoryStore, SnapshotFile, SnapshotWriter, SNAPSHOT_VERSION};
use catalog_core::{CatalogError, StoreError};

use super::helpers::{create_file, field, open_catalog, persistent_config, OWNER};

#[tokio::test]
async fn test_reopen_restores_committed_state() {
    let dir = tempdir().unwrap();
    let config = persistent_config(dir.path());

    let (catalog, store) = open_catalog(&config);
    assert!(store.is_persistent());
    let file = create_file(&catalog, "PAYROLL").await;
    let first = catalog
        .create_field(&file.id, field("EMP-NO", 6, "numeric"), OWNER)
        .await
        .unwrap();
    catalog
        .create_field(&file.id, field("EMP-NAME", 25, "character"), OWNER)
        .await
        .unwrap();
    catalog
        .update_field(
            &first.id,
            FieldPatch {
                field_size: Some(9),
                ..Default::default()
            },
            OWNER,
        )
        .await
        .unwrap();
    let before = store.state();
    drop(catalog);

    assert!(config.snapshot_path().exists());
    assert!(!config.snapshot_path().with_extension("json.tmp").exists());

    let (_, reopened) = open_catalog(&config);
    assert_eq!(*reopened.state(), *before);

    let fields = reopened.fields_of_file(&file.id).await.unwrap();
    let spans: Vec<(u32, u32)> = fields
        .iter()
        .map(|f| (f.beg_position, f.end_position))
        .collect();
    assert_eq!(spans, vec![(1, 9), (10, 34)]);
}

#[tokio::test]
async fn test_failed_snapshot_write_keeps_layout() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().join("catalog");
    let config = persistent_config(&data_dir);
    let (catalog, store) = open_catalog(&config);

    let file = create_file(&catalog, "INVOICE").await;
    let mut ids = Vec::new();
    for (name, size) in [("INV-NO", 10), ("INV-DATE", 20), ("INV-TOTAL", 30)] {
        let created = catalog
            .create_field(&file.id, field(name, size, "character"), OWNER)
            .await
            .unwrap();
        ids.push(created.id);
    }
    let before = store.state();

    // Snapshot writes now fail: the data directory is a plain file.
    fs::remove_dir_all(&data_dir).unwrap();
    fs::write(&data_dir, b"not a directory").unwrap();

    let err = catalog
        .update_field(
            &ids[0],
            FieldPatch {
                field_size: Some(15),
                ..Default::default()
            },
            OWNER,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::TransactionFailure {
            operation: "the update of the DataField"
        }
    );
    assert_eq!(*store.state(), *before);

    let spans: Vec<(u32, u32)> = store
        .fields_of_file(&file.id)
        .await
        .unwrap()
        .iter()
        .map(|f| (f.beg_position, f.end_position))
        .collect();
    assert_eq!(spans, vec![(1, 10), (11, 30), (31, 60)]);
}

#[timeout(5000)]
#[test]
fn test_missing_snapshot_opens_empty() {
    let dir = tempdir().unwrap();
    let config = persistent_config(&dir.path().join("not-yet-created"));

    let store = MemoryStore::open(&config).unwrap();
    assert!(store.state().files.is_empty());
    assert!(SnapshotWriter::new(&config).load().unwrap().is_none());
}

#[tokio::test]
async fn test_tampered_snapshot_is_corrupt() {
    let dir = tempdir().unwrap();
    let config = persistent_config(dir.path());
    let (catalog, _) = open_catalog(&config);
    let file = create_file(&catalog, "AUDIT").await;
    catalog
        .create_field(&file.id, field("TS", 26, "datetime"), OWNER)
        .await
        .unwrap();

    let path = config.snapshot_path();
    let mut snapshot: SnapshotFile =
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    snapshot.state["files"][&file.id]["shortName"] = serde_json::json!("EDITED");
    fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

    let err = MemoryStore::open(&config).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[timeout(5000)]
#[test]
fn test_unknown_version_is_corrupt() {
    let dir = tempdir().unwrap();
    let config = persistent_config(dir.path());
    let snapshot = SnapshotFile {
        version: SNAPSHOT_VERSION + 1,
        checksum: 0,
        state: serde_json::json!({}),
    };
    fs::write(config.snapshot_path(), serde_json::to_vec(&snapshot).unwrap()).unwrap();

    let err = SnapshotWriter::new(&config).load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(message) if message.contains("version")));
}

#[timeout(5000)]
#[test]
fn test_garbage_snapshot_is_corrupt() {
    let dir = tempdir().unwrap();
    let config = persistent_config(dir.path());
    fs::write(config.snapshot_path(), b"{ not json").unwrap();

    assert!(matches!(
        MemoryStore::open(&config),
        Err(StoreError::Corrupt(_))
    ));
}
