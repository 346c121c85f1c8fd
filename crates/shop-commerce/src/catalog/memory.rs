//! Catalog and stock source held in memory.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductCatalog, Stock, StockChecker};
use crate::error::SourceError;
use crate::ids::ProductId;

/// Shape of the storefront's JSON API database.
///
/// ```json
/// { "products": [{ "id": 1, "title": "...", "price": 179.9, "image": "..." }],
///   "stock":    [{ "id": 1, "amount": 3 }] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub stock: Vec<Stock>,
}

/// Serves products and stock from memory.
///
/// Stands in for the HTTP API in tests and offline runs. A product without a
/// stock entry reports zero units.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    stock: RwLock<HashMap<ProductId, i64>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed fixture.
    pub fn from_fixture(fixture: CatalogFixture) -> Self {
        let catalog = Self::new();
        for product in fixture.products {
            catalog.insert_product(product);
        }
        for stock in fixture.stock {
            catalog.set_stock(stock.id, stock.amount);
        }
        catalog
    }

    /// Parse a fixture from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_fixture(serde_json::from_str(json)?))
    }

    /// Add a product with its stock level.
    pub fn with_product(self, product: Product, stock: i64) -> Self {
        self.set_stock(product.id, stock);
        self.insert_product(product);
        self
    }

    /// Insert or replace a product.
    pub fn insert_product(&self, product: Product) {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.id, product);
    }

    /// Set the available units for a product.
    pub fn set_stock(&self, product_id: ProductId, amount: i64) {
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product_id, amount);
    }

    /// Snapshot of all products, ordered by id.
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn fetch_product(&self, product_id: ProductId) -> Result<Product, SourceError> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .cloned()
            .ok_or(SourceError::NotFound(product_id))
    }
}

#[async_trait]
impl StockChecker for InMemoryCatalog {
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Stock, SourceError> {
        let known = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&product_id);
        let amount = self
            .stock
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .copied();

        match (known, amount) {
            (_, Some(amount)) => Ok(Stock::new(product_id, amount)),
            (true, None) => Ok(Stock::new(product_id, 0)),
            (false, None) => Err(SourceError::NotFound(product_id)),
        }
    }
}
