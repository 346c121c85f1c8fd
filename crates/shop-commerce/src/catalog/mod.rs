//! Catalog module.
//!
//! Product and stock types plus the two lookups the cart depends on.

mod memory;
mod product;
mod stock;

pub use memory::{CatalogFixture, InMemoryCatalog};
pub use product::{Product, Rating};
pub use stock::Stock;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::ids::ProductId;

/// Resolves product metadata by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch the product with this id.
    async fn fetch_product(&self, product_id: ProductId) -> Result<Product, SourceError>;
}

/// Reports how many units of a product are available.
#[async_trait]
pub trait StockChecker: Send + Sync {
    /// Fetch the current stock for this product.
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Stock, SourceError>;
}
