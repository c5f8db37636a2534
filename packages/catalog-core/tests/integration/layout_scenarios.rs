//! Field layout scenarios driven through the public catalog API.

use catalog_core::coordinator::{FieldPatch, NewValidData};
use catalog_core::layout::check_contiguity;
use catalog_core::model::FieldType;
use catalog_core::store::CatalogStore;
use catalog_core::{CatalogError, LayoutError};

use super::helpers::{create_file, field, memory_catalog, OWNER};

fn positions(detail: &catalog_core::model::FileDetail) -> Vec<(&str, u32, u32)> {
    detail
        .fields
        .iter()
        .map(|f| {
            (
                f.field.field_name.as_str(),
                f.field.beg_position,
                f.field.end_position,
            )
        })
        .collect()
}

#[tokio::test]
async fn test_record_layout_edit_session() {
    let (catalog, _) = memory_catalog();
    let file = create_file(&catalog, "CUSTMAST").await;

    let id = catalog
        .create_field(&file.id, field("CUST-ID", 8, "numeric"), OWNER)
        .await
        .unwrap();
    let name = catalog
        .create_field(&file.id, field("CUST-NAME", 30, "CHARACTER"), OWNER)
        .await
        .unwrap();
    let balance = catalog
        .create_field(&file.id, field("BALANCE", 5, "Packed_Decimal"), OWNER)
        .await
        .unwrap();
    assert_eq!(balance.field_type, FieldType::PackedDecimal);

    // widen the name, then narrow the id
    catalog
        .update_field(
            &name.id,
            FieldPatch {
                field_size: Some(40),
                ..Default::default()
            },
            OWNER,
        )
        .await
        .unwrap();
    catalog
        .update_field(
            &id.id,
            FieldPatch {
                field_size: Some(6),
                packed: Some(true),
                ..Default::default()
            },
            OWNER,
        )
        .await
        .unwrap();

    let detail = catalog.get_file(&file.id).await.unwrap();
    assert_eq!(
        positions(&detail),
        vec![("CUST-ID", 1, 6), ("CUST-NAME", 7, 46), ("BALANCE", 47, 51)]
    );
    assert!(detail.fields[0].field.packed);

    let rows: Vec<_> = detail.field_rows().cloned().collect();
    check_contiguity(&rows).unwrap();
}

#[tokio::test]
async fn test_delete_leaves_gap_until_next_append() {
    let (catalog, store) = memory_catalog();
    let file = create_file(&catalog, "ORDERS").await;

    let mut ids = Vec::new();
    for (name, size) in [("A", 4), ("B", 4), ("C", 4)] {
        let created = catalog
            .create_field(&file.id, field(name, size, "character"), OWNER)
            .await
            .unwrap();
        ids.push(created.id);
    }

    catalog.delete_field(&ids[1], OWNER).await.unwrap();
    let fields = store.fields_of_file(&file.id).await.unwrap();
    assert_eq!(
        check_contiguity(&fields),
        Err(LayoutError::Gap {
            before: "A".to_string(),
            after: "C".to_string(),
            end: 4,
            beg: 9,
        })
    );

    let d = catalog
        .create_field(&file.id, field("D", 2, "character"), OWNER)
        .await
        .unwrap();
    assert_eq!((d.beg_position, d.end_position), (13, 14));
}

#[tokio::test]
async fn test_shrink_after_gap_moves_only_later_fields() {
    let (catalog, store) = memory_catalog();
    let file = create_file(&catalog, "LEDGER").await;

    let mut ids = Vec::new();
    for (name, size) in [("A", 10), ("B", 10), ("C", 10), ("D", 10)] {
        let created = catalog
            .create_field(&file.id, field(name, size, "character"), OWNER)
            .await
            .unwrap();
        ids.push(created.id);
    }
    catalog.delete_field(&ids[0], OWNER).await.unwrap();

    catalog
        .update_field(
            &ids[2],
            FieldPatch {
                field_size: Some(1),
                ..Default::default()
            },
            OWNER,
        )
        .await
        .unwrap();

    let spans: Vec<(String, u32, u32)> = store
        .fields_of_file(&file.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| (f.field_name, f.beg_position, f.end_position))
        .collect();
    assert_eq!(
        spans,
        vec![
            ("B".to_string(), 11, 20),
            ("C".to_string(), 21, 21),
            ("D".to_string(), 22, 31),
        ]
    );
}

#[tokio::test]
async fn test_file_delete_cascades_everything() {
    let (catalog, store) = memory_catalog();
    let file = create_file(&catalog, "CODES").await;
    let code = catalog
        .create_field(&file.id, field("STATUS", 1, "character"), OWNER)
        .await
        .unwrap();
    for (value, desc) in [("A", "Active"), ("I", "Inactive")] {
        catalog
            .create_valid_data(
                &code.id,
                NewValidData {
                    valid_data: Some(value.to_string()),
                    valid_data_desc: Some(desc.to_string()),
                    archive: None,
                },
                OWNER,
            )
            .await
            .unwrap();
    }

    catalog.delete_file(&file.id, OWNER).await.unwrap();

    let state = store.state();
    assert!(state.files.is_empty());
    assert!(state.fields.is_empty());
    assert!(state.valid_data.is_empty());

    assert_eq!(
        catalog.delete_file(&file.id, OWNER).await.unwrap(),
        file.id
    );
    let err = catalog.get_file(&file.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}
