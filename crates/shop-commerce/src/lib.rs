//! Storefront cart domain types and the cart store.
//!
//! This crate provides the state behind a storefront's shopping cart:
//!
//! - **Catalog**: products, stock levels and the lookups the cart needs
//! - **Cart**: the ordered, duplicate-free list of lines and its totals
//! - **Store**: validated add/remove/update operations that persist every
//!   change and publish snapshots to subscribers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shop_cache::Cache;
//! use shop_commerce::prelude::*;
//!
//! let catalog = Arc::new(InMemoryCatalog::from_json(&fixture)?);
//! let store = CartStore::new(Cache::open_dir(".shop")?, catalog.clone(), catalog)
//!     .with_notifier(Arc::new(TracingNotifier));
//!
//! store.add_product(ProductId::new(1)).await?;
//! store.update_product_amount(UpdateProductAmount::new(1u64, 2)).await?;
//!
//! let cart = store.cart();
//! println!("{} items", cart.total_amount());
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;

pub use error::{CartError, InvalidCart, SourceError};
pub use ids::ProductId;
pub use money::{Currency, Price};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CartError, InvalidCart, SourceError};
    pub use crate::ids::ProductId;
    pub use crate::money::{Currency, Price};

    // Catalog
    pub use crate::catalog::{
        CatalogFixture, InMemoryCatalog, Product, ProductCatalog, Rating, Stock, StockChecker,
    };

    // Cart
    pub use crate::cart::{
        Cart, CartLine, CartStore, CollectingNotifier, NoopNotifier, Notice, NoticeLevel,
        Notifier, StoreConfig, TracingNotifier, UpdateProductAmount,
    };
}
