//! Product types.

use crate::ids::ProductId;
use crate::money::Price;
use serde::{Deserialize, Serialize};

/// Customer rating summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    /// Average rating.
    pub rate: f64,
    /// Number of ratings.
    pub count: u64,
}

/// A product as served by the storefront catalog.
///
/// Immutable once fetched; the cart stores a copy next to the amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name. The storefront API calls this field `title`.
    #[serde(rename = "title", alias = "name")]
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Rating metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

impl Product {
    /// Create a product with the fields the cart needs.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: String::new(),
            category: None,
            rating: None,
        }
    }

    /// Set the image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
