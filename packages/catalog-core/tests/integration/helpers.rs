//! Shared fixtures for the integration tests.

use std::path::Path;
use std::sync::Arc;

use catalog_core::config::CatalogConfig;
use catalog_core::coordinator::{NewDataFile, NewField};
use catalog_core::model::DataFile;
use catalog_core::ownership::OwnerOnly;
use catalog_core::store::MemoryStore;
use catalog_core::Catalog;

pub const OWNER: &str = "jdoe";

/// Catalog over a fresh in-memory store.
pub fn memory_catalog() -> (Catalog, MemoryStore) {
    let store = MemoryStore::new();
    let catalog = Catalog::new(
        Arc::new(store.clone()),
        Arc::new(OwnerOnly),
        CatalogConfig::in_memory(),
    );
    (catalog, store)
}

/// Configuration persisting into `dir`.
pub fn persistent_config(dir: &Path) -> CatalogConfig {
    CatalogConfig {
        data_dir: dir.to_path_buf(),
        persistence_retry_delay_ms: 1,
        ..Default::default()
    }
}

/// Catalog over a store opened from `config`.
pub fn open_catalog(config: &CatalogConfig) -> (Catalog, MemoryStore) {
    let store = MemoryStore::open(config).unwrap();
    let catalog = Catalog::new(
        Arc::new(store.clone()),
        Arc::new(OwnerOnly),
        config.clone(),
    );
    (catalog, store)
}

pub async fn create_file(catalog: &Catalog, name: &str) -> DataFile {
    let spec = NewDataFile {
        short_name: Some(name.to_string()),
        long_name: Some(format!("{} master file", name)),
        file_location: Some(format!("/prod/{}.dat", name.to_lowercase())),
        file_size: Some(1024),
        ..Default::default()
    };
    catalog.create_file(spec, OWNER).await.unwrap()
}

pub fn field(name: &str, size: i64, field_type: &str) -> NewField {
    NewField {
        field_name: Some(name.to_string()),
        field_size: Some(size),
        field_type: Some(field_type.to_string()),
        ..Default::default()
    }
}
