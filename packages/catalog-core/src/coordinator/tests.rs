use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::error::StoreResult;
use crate::layout::check_contiguity;
use crate::model::{DataStructure, ValidData};
use crate::ownership::OwnerOnly;
use crate::store::{Change, MemoryStore};

const OWNER: &str = "alice";
const OTHER: &str = "mallory";

fn catalog() -> (Catalog, MemoryStore) {
    let store = MemoryStore::new();
    let catalog = Catalog::new(
        Arc::new(store.clone()),
        Arc::new(OwnerOnly),
        CatalogConfig::in_memory(),
    );
    (catalog, store)
}

fn file_spec(name: &str) -> NewDataFile {
    NewDataFile {
        short_name: Some(name.to_string()),
        long_name: Some(format!("{} long name", name)),
        file_location: Some("/mnt/data".to_string()),
        file_size: Some(0),
        ..Default::default()
    }
}

fn field_spec(name: &str, size: i64) -> NewField {
    NewField {
        field_name: Some(name.to_string()),
        field_size: Some(size),
        field_type: Some("character".to_string()),
        ..Default::default()
    }
}

fn resize(size: i64) -> FieldPatch {
    FieldPatch {
        field_size: Some(size),
        ..Default::default()
    }
}

async fn file_with_fields(catalog: &Catalog, sizes: &[i64]) -> (DataFile, Vec<DataField>) {
    let file = catalog.create_file(file_spec("CUST"), OWNER).await.unwrap();
    let mut fields = Vec::new();
    for (i, size) in sizes.iter().enumerate() {
        let name = format!("F{}", i + 1);
        fields.push(
            catalog
                .create_field(&file.id, field_spec(&name, *size), OWNER)
                .await
                .unwrap(),
        );
    }
    (file, fields)
}

async fn spans(catalog: &Catalog, file_id: &str) -> Vec<(String, u32, u32)> {
    catalog
        .store()
        .fields_of_file(file_id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| (f.field_name, f.beg_position, f.end_position))
        .collect()
}

fn named(spans: &[(&str, u32, u32)]) -> Vec<(String, u32, u32)> {
    spans
        .iter()
        .map(|(n, b, e)| (n.to_string(), *b, *e))
        .collect()
}

#[tokio::test]
async fn test_create_appends_contiguously() {
    let (catalog, _) = catalog();
    let sizes = [4, 1, 17, 9, 2];
    let (file, _) = file_with_fields(&catalog, &sizes).await;

    let fields = catalog.store().fields_of_file(&file.id).await.unwrap();
    assert_eq!(fields.len(), sizes.len());
    assert_eq!(fields[0].beg_position, 1);
    for (field, size) in fields.iter().zip(sizes) {
        assert_eq!(field.end_position, field.beg_position + size as u32 - 1);
    }
    for pair in fields.windows(2) {
        assert_eq!(pair[1].beg_position, pair[0].end_position + 1);
    }
    check_contiguity(&fields).unwrap();
}

#[tokio::test]
async fn test_resize_grow_then_shrink() {
    let (catalog, _) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[10, 20, 30]).await;

    let first = catalog
        .update_field(&fields[0].id, resize(15), OWNER)
        .await
        .unwrap();
    assert_eq!((first.beg_position, first.end_position), (1, 15));
    assert_eq!(
        spans(&catalog, &file.id).await,
        named(&[("F1", 1, 15), ("F2", 16, 35), ("F3", 36, 65)])
    );

    let stored = catalog.store().fields_of_file(&file.id).await.unwrap();
    let sizes: Vec<u32> = stored.iter().map(|f| f.field_size).collect();
    assert_eq!(sizes, vec![15, 20, 30]);

    catalog
        .update_field(&fields[1].id, resize(5), OWNER)
        .await
        .unwrap();
    assert_eq!(
        spans(&catalog, &file.id).await,
        named(&[("F1", 1, 15), ("F2", 16, 20), ("F3", 21, 50)])
    );
}

#[tokio::test]
async fn test_attribute_update_keeps_positions() {
    let (catalog, _) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[10, 20, 30]).await;
    let before = spans(&catalog, &file.id).await;

    let patch = FieldPatch {
        description: Some("customer number".to_string()),
        field_size: Some(20),
        ..Default::default()
    };
    let updated = catalog.update_field(&fields[1].id, patch, OWNER).await.unwrap();

    assert_eq!(updated.description, "customer number");
    assert_eq!(spans(&catalog, &file.id).await, before);
}

#[tokio::test]
async fn test_update_requires_some_attribute() {
    let (catalog, _) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[3]).await;

    let err = catalog
        .update_field(&fields[0].id, FieldPatch::default(), OWNER)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::InvalidInput("No valid fields provided for update.".to_string())
    );
}

#[tokio::test]
async fn test_rejects_non_positive_sizes() {
    let (catalog, store) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[10]).await;

    for size in [0, -5] {
        let err = catalog
            .create_field(&file.id, field_spec("BAD", size), OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));

        let err = catalog
            .update_field(&fields[0].id, resize(size), OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
    }
    assert_eq!(store.state().fields.len(), 1);
    assert_eq!(spans(&catalog, &file.id).await, named(&[("F1", 1, 10)]));
}

#[tokio::test]
async fn test_rejects_unknown_field_type() {
    let (catalog, store) = catalog();
    let (file, _) = file_with_fields(&catalog, &[]).await;

    let spec = NewField {
        field_type: Some("VARCHAR".to_string()),
        ..field_spec("NAME", 4)
    };
    let err = catalog.create_field(&file.id, spec, OWNER).await.unwrap_err();

    let CatalogError::InvalidInput(message) = err else {
        panic!("expected InvalidInput");
    };
    assert!(message.contains("PACKED_DECIMAL"));
    assert!(store.state().fields.is_empty());
}

#[tokio::test]
async fn test_deleting_field_twice_is_not_found() {
    let (catalog, _) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[10, 5]).await;

    let id = catalog.delete_field(&fields[0].id, OWNER).await.unwrap();
    assert_eq!(id, fields[0].id);

    let err = catalog.delete_field(&fields[0].id, OWNER).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "DataField", .. }));
}

#[tokio::test]
async fn test_layout_scenario() {
    let (catalog, _) = catalog();
    let file = catalog.create_file(file_spec("CUST"), OWNER).await.unwrap();

    let a = catalog
        .create_field(&file.id, field_spec("A", 10), OWNER)
        .await
        .unwrap();
    assert_eq!((a.beg_position, a.end_position), (1, 10));
    let b = catalog
        .create_field(&file.id, field_spec("B", 5), OWNER)
        .await
        .unwrap();
    assert_eq!((b.beg_position, b.end_position), (11, 15));

    catalog.update_field(&a.id, resize(20), OWNER).await.unwrap();
    assert_eq!(
        spans(&catalog, &file.id).await,
        named(&[("A", 1, 20), ("B", 21, 25)])
    );

    catalog.delete_field(&a.id, OWNER).await.unwrap();
    assert_eq!(spans(&catalog, &file.id).await, named(&[("B", 21, 25)]));

    // a new field still goes after the last one, not into the gap
    let c = catalog
        .create_field(&file.id, field_spec("C", 3), OWNER)
        .await
        .unwrap();
    assert_eq!((c.beg_position, c.end_position), (26, 28));
}

#[tokio::test]
async fn test_delete_field_cascades() {
    let (catalog, store) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[8]).await;
    let field_id = &fields[0].id;

    for value in ["A", "B"] {
        catalog
            .create_valid_data(field_id, valid_spec(value), OWNER)
            .await
            .unwrap();
    }
    store
        .write(Change::InsertStructure(structure(field_id, 1)))
        .await
        .unwrap();

    catalog.delete_field(field_id, OWNER).await.unwrap();

    let state = store.state();
    assert!(state.fields.is_empty());
    assert!(state.valid_data.is_empty());
    assert!(state.structures.is_empty());
}

fn valid_spec(value: &str) -> NewValidData {
    NewValidData {
        valid_data: Some(value.to_string()),
        valid_data_desc: Some(format!("{} description", value)),
        archive: None,
    }
}

fn structure(field_id: &str, ds_id: u32) -> DataStructure {
    DataStructure {
        id: crate::model::new_id(),
        field_id: field_id.to_string(),
        ds_id,
        ds_beg_position: 1,
        ds_end_position: 2,
        ds_name: format!("DS{}", ds_id),
        ds_desc: String::new(),
        archive: false,
    }
}

#[tokio::test]
async fn test_valid_data_sequences_are_per_field() {
    let (catalog, _) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[2, 2]).await;

    let mut seqs = Vec::new();
    for value in ["Y", "N", "U"] {
        let row = catalog
            .create_valid_data(&fields[0].id, valid_spec(value), OWNER)
            .await
            .unwrap();
        seqs.push(row.seq_id);
    }
    assert_eq!(seqs, vec![1, 2, 3]);

    let other = catalog
        .create_valid_data(&fields[1].id, valid_spec("X"), OWNER)
        .await
        .unwrap();
    assert_eq!(other.seq_id, 1);
}

#[tokio::test]
async fn test_valid_data_update_and_delete() {
    let (catalog, store) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[1]).await;
    let row = catalog
        .create_valid_data(&fields[0].id, valid_spec("Y"), OWNER)
        .await
        .unwrap();

    let patch = ValidDataPatch {
        valid_data_desc: Some("Yes".to_string()),
        ..Default::default()
    };
    let updated = catalog.update_valid_data(&row.id, patch, OWNER).await.unwrap();
    assert_eq!(updated.valid_data_desc, "Yes");
    assert_eq!(updated.seq_id, 1);

    let err = catalog
        .update_valid_data(&row.id, ValidDataPatch::default(), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));

    let deleted = catalog.delete_valid_data(&row.id, OWNER).await.unwrap();
    assert_eq!(deleted.id, row.id);
    assert!(store.state().valid_data.is_empty());

    let err = catalog.delete_valid_data(&row.id, OWNER).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "ValidData", .. }));
}

#[tokio::test]
async fn test_non_owner_is_forbidden_everywhere() {
    let (catalog, store) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[5, 5]).await;
    let row = catalog
        .create_valid_data(&fields[0].id, valid_spec("Y"), OWNER)
        .await
        .unwrap();
    let before = store.state();

    let patch = DataFilePatch {
        long_name: Some("renamed".to_string()),
        ..Default::default()
    };
    let results = vec![
        catalog.update_file(&file.id, patch, OTHER).await.map(|_| ()),
        catalog.delete_file(&file.id, OTHER).await.map(|_| ()),
        catalog
            .create_field(&file.id, field_spec("X", 1), OTHER)
            .await
            .map(|_| ()),
        catalog
            .update_field(&fields[0].id, resize(9), OTHER)
            .await
            .map(|_| ()),
        catalog.delete_field(&fields[1].id, OTHER).await.map(|_| ()),
        catalog
            .create_valid_data(&fields[0].id, valid_spec("N"), OTHER)
            .await
            .map(|_| ()),
        catalog
            .update_valid_data(
                &row.id,
                ValidDataPatch {
                    archive: Some(true),
                    ..Default::default()
                },
                OTHER,
            )
            .await
            .map(|_| ()),
        catalog.delete_valid_data(&row.id, OTHER).await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(CatalogError::Forbidden(_))));
    }
    assert_eq!(*store.state(), *before);
}

#[tokio::test]
async fn test_malformed_ids_are_rejected_before_lookup() {
    let (catalog, _) = catalog();

    let err = catalog.get_file("abc").await.unwrap_err();
    assert_eq!(
        err,
        CatalogError::InvalidInput("Invalid DataFile ID format.".to_string())
    );
    let err = catalog.update_field("", resize(3), OWNER).await.unwrap_err();
    assert_eq!(
        err,
        CatalogError::InvalidInput("Invalid DataField ID format.".to_string())
    );
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let (catalog, _) = catalog();
    let missing = crate::model::new_id();

    let err = catalog
        .create_field(&missing, field_spec("A", 1), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "DataFile", .. }));

    let err = catalog
        .update_field(&missing, resize(2), OWNER)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("DataField with ID {} not found.", missing));

    let err = catalog.get_file(&missing).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn test_file_lifecycle() {
    let (catalog, store) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[4, 6]).await;
    catalog
        .create_valid_data(&fields[1].id, valid_spec("Z"), OWNER)
        .await
        .unwrap();
    store
        .write(Change::InsertStructure(structure(&fields[0].id, 2)))
        .await
        .unwrap();
    store
        .write(Change::InsertStructure(structure(&fields[0].id, 1)))
        .await
        .unwrap();

    let other = catalog.create_file(file_spec("ACCT"), OWNER).await.unwrap();
    catalog.create_file(file_spec("HIDDEN"), OTHER).await.unwrap();

    let listed = catalog.list_files(OWNER).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|s| s.file.short_name.as_str()).collect();
    assert_eq!(names, vec!["ACCT", "CUST"]);
    assert_eq!(listed[1].fields.len(), 2);
    assert_eq!(listed[1].fields[0].field_name, "F1");

    let detail = catalog.get_file(&file.id).await.unwrap();
    assert_eq!(detail.fields.len(), 2);
    let ds_ids: Vec<u32> = detail.fields[0]
        .data_structures
        .iter()
        .map(|s| s.ds_id)
        .collect();
    assert_eq!(ds_ids, vec![1, 2]);
    assert_eq!(detail.fields[1].valid_data.len(), 1);

    let patch = DataFilePatch {
        file_size: Some(10),
        ..Default::default()
    };
    let updated = catalog.update_file(&file.id, patch, OWNER).await.unwrap();
    assert_eq!(updated.file_size, 10);
    assert!(updated.updated_at >= updated.created_at);

    let id = catalog.delete_file(&file.id, OWNER).await.unwrap();
    assert_eq!(id, file.id);
    let state = store.state();
    assert!(state.file(&file.id).is_none());
    assert!(state.fields.is_empty());
    assert!(state.valid_data.is_empty());
    assert!(state.structures.is_empty());
    assert!(state.file(&other.id).is_some());

    // second delete is a no-op
    let id = catalog.delete_file(&file.id, OWNER).await.unwrap();
    assert_eq!(id, file.id);
}

#[tokio::test]
async fn test_create_file_validates_input() {
    let (catalog, store) = catalog();

    let spec = NewDataFile {
        file_location: Some("   ".to_string()),
        ..file_spec("CUST")
    };
    let err = catalog.create_file(spec, OWNER).await.unwrap_err();
    assert_eq!(
        err,
        CatalogError::InvalidInput(
            "fileLocation must be a string with at least 1 character(s).".to_string()
        )
    );

    let spec = NewDataFile {
        file_size: Some(-1),
        ..file_spec("CUST")
    };
    assert!(catalog.create_file(spec, OWNER).await.is_err());
    assert!(store.state().files.is_empty());
}

#[tokio::test]
async fn test_field_must_belong_to_routed_file() {
    let (catalog, _) = catalog();
    let (file, fields) = file_with_fields(&catalog, &[1]).await;
    let other = catalog.create_file(file_spec("ACCT"), OWNER).await.unwrap();

    catalog
        .ensure_field_in_file(&file.id, &fields[0].id)
        .await
        .unwrap();
    let err = catalog
        .ensure_field_in_file(&other.id, &fields[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "DataField", .. }));
}

#[tokio::test]
async fn test_deleted_file_releases_its_lock() {
    let (catalog, _) = catalog();
    let (file, _) = file_with_fields(&catalog, &[1, 2]).await;
    assert_eq!(catalog.locks.tracked(), 1);

    catalog.delete_file(&file.id, OWNER).await.unwrap();
    assert_eq!(catalog.locks.tracked(), 0);
}

#[tokio::test]
async fn test_file_delete_staging_rechecks_the_file() {
    let (catalog, store) = catalog();
    let (file, _) = file_with_fields(&catalog, &[3, 4]).await;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(
        catalog.stage_delete_file(tx.as_mut(), &file.id).await.unwrap(),
        Some(2)
    );
    // Same transaction, file already staged for deletion
    assert_eq!(
        catalog.stage_delete_file(tx.as_mut(), &file.id).await.unwrap(),
        None
    );
    tx.commit().await.unwrap();
    assert!(store.state().files.is_empty());
}

#[tokio::test]
async fn test_valid_data_update_uses_transaction_view() {
    let (catalog, store) = catalog();
    let (_, fields) = file_with_fields(&catalog, &[1]).await;
    let row = catalog
        .create_valid_data(&fields[0].id, valid_spec("Y"), OWNER)
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.apply(Change::DeleteValidData { id: row.id.clone() })
        .await
        .unwrap();
    let patch = ValidDataPatch {
        archive: Some(true),
        ..Default::default()
    };
    let err = catalog
        .stage_update_valid_data(tx.as_mut(), &row.id, &patch)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { entity: "ValidData", .. }));
    tx.rollback().await;

    assert_eq!(store.state().valid_data.len(), 1);
}

/// Store whose transactions fail on the n-th staged field update.
struct FlakyStore {
    inner: MemoryStore,
    fail_on_update: usize,
}

struct FlakyTransaction {
    inner: Box<dyn StoreTransaction>,
    fail_on_update: usize,
    updates: usize,
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>> {
        self.inner.file(id).await
    }

    async fn files_owned_by(&self, owner: &str) -> StoreResult<Vec<DataFile>> {
        self.inner.files_owned_by(owner).await
    }

    async fn field(&self, id: &str) -> StoreResult<Option<DataField>> {
        self.inner.field(id).await
    }

    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>> {
        self.inner.fields_of_file(file_id).await
    }

    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>> {
        self.inner.valid_data(id).await
    }

    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>> {
        self.inner.valid_data_of_field(field_id).await
    }

    async fn structures_of_field(&self, field_id: &str) -> StoreResult<Vec<DataStructure>> {
        self.inner.structures_of_field(field_id).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            fail_on_update: self.fail_on_update,
            updates: 0,
        }))
    }
}

#[async_trait]
impl StoreTransaction for FlakyTransaction {
    async fn file(&self, id: &str) -> StoreResult<Option<DataFile>> {
        self.inner.file(id).await
    }

    async fn field(&self, id: &str) -> StoreResult<Option<DataField>> {
        self.inner.field(id).await
    }

    async fn fields_of_file(&self, file_id: &str) -> StoreResult<Vec<DataField>> {
        self.inner.fields_of_file(file_id).await
    }

    async fn valid_data(&self, id: &str) -> StoreResult<Option<ValidData>> {
        self.inner.valid_data(id).await
    }

    async fn valid_data_of_field(&self, field_id: &str) -> StoreResult<Vec<ValidData>> {
        self.inner.valid_data_of_field(field_id).await
    }

    async fn apply(&mut self, change: Change) -> StoreResult<()> {
        if matches!(change, Change::UpdateField(_)) {
            self.updates += 1;
            if self.updates == self.fail_on_update {
                return Err(StoreError::Io("simulated write failure".to_string()));
            }
        }
        self.inner.apply(change).await
    }

    async fn commit(&mut self) -> StoreResult<()> {
        self.inner.commit().await
    }

    async fn rollback(&mut self) {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_failed_shift_changes_nothing() {
    let memory = MemoryStore::new();
    let healthy = Catalog::new(
        Arc::new(memory.clone()),
        Arc::new(OwnerOnly),
        CatalogConfig::in_memory(),
    );
    let (file, fields) = file_with_fields(&healthy, &[10, 10, 10, 10]).await;
    let before = spans(&healthy, &file.id).await;

    let flaky = Catalog::new(
        Arc::new(FlakyStore {
            inner: memory.clone(),
            fail_on_update: 3,
        }),
        Arc::new(OwnerOnly),
        CatalogConfig::in_memory(),
    );
    let err = flaky
        .update_field(&fields[0].id, resize(12), OWNER)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CatalogError::TransactionFailure {
            operation: "the update of the DataField"
        }
    );
    assert_eq!(spans(&healthy, &file.id).await, before);
    let stored = memory.state().field(&fields[0].id).unwrap();
    assert_eq!(stored.field_size, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resizes_stay_contiguous() {
    let (catalog, store) = catalog();
    let catalog = Arc::new(catalog);
    let (file, fields) = file_with_fields(&catalog, &[3, 3, 3, 3, 3]).await;

    let mut tasks = Vec::new();
    for i in 0..40usize {
        let catalog = Arc::clone(&catalog);
        let field_id = fields[i % fields.len()].id.clone();
        let size = (i % 7 + 1) as i64;
        tasks.push(tokio::spawn(async move {
            catalog.update_field(&field_id, resize(size), OWNER).await
        }));
    }
    for task in tasks {
        // a request for the size a field already has is a plain update
        task.await.unwrap().unwrap();
    }

    let layout = store.state().fields_of_file(&file.id);
    assert_eq!(layout.len(), 5);
    check_contiguity(&layout).unwrap();
}
