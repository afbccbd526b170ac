//! Product catalog fetch interface.
//!
//! Stands in for the remote commerce API: the enrichment pipeline only
//! needs "give me products" and "give me discounts". The JSON-file
//! implementation serves a locally synced catalog snapshot.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use pricegate_core::types::{Discount, Product};

use crate::error::StoreError;

// ─── Fetch Interface ─────────────────────────────────────────────────

/// The simple fetch interface the enrichment pipeline consumes.
pub trait ProductCatalog {
    fn products(&self) -> Result<Vec<Product>, StoreError>;
    fn discounts(&self) -> Result<Vec<Discount>, StoreError>;
}

// ─── JSON File Catalog ───────────────────────────────────────────────

/// Catalog document shape: `{"products": [...], "discounts": [...]}`.
#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    discounts: Vec<Discount>,
}

/// Catalog backed by a single JSON file, read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<CatalogDocument, StoreError> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ProductCatalog for JsonCatalog {
    fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read_document()?.products)
    }

    fn discounts(&self) -> Result<Vec<Discount>, StoreError> {
        Ok(self.read_document()?.discounts)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "products": [
            {"id": 1, "title": "Desk Lamp", "price": "100.00", "vendor": "Lumen"},
            {"id": 2, "title": "Notebook", "price": "12.50"}
        ],
        "discounts": [
            {"id": 7, "code": "SPRING30", "value_type": "percentage", "value": "-30.0"}
        ]
    }"#;

    fn catalog_with(contents: &str) -> (tempfile::TempDir, JsonCatalog) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, contents).expect("write catalog");
        (dir, JsonCatalog::new(path))
    }

    #[test]
    fn reads_products_and_discounts() {
        let (_dir, catalog) = catalog_with(CATALOG);

        let products = catalog.products().expect("products");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Desk Lamp");
        assert_eq!(products[1].price, "12.50");

        let discounts = catalog.discounts().expect("discounts");
        assert_eq!(discounts.len(), 1);
        assert_eq!(discounts[0].code, "SPRING30");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let (_dir, catalog) = catalog_with("{}");
        assert!(catalog.products().expect("products").is_empty());
        assert!(catalog.discounts().expect("discounts").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = JsonCatalog::new(dir.path().join("nope.json"));
        assert!(catalog.products().is_err());
    }
}
