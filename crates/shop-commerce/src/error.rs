//! Cart error types.

use thiserror::Error;

use crate::ids::ProductId;

/// Errors reported by a product or stock source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source has no record for this product.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The source could not be reached or answered with an error.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while mutating the cart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Product metadata could not be fetched.
    #[error("Failed to fetch product {product_id}: {source}")]
    ProductFetchFailed {
        product_id: ProductId,
        #[source]
        source: SourceError,
    },

    /// The product is not in the cart.
    #[error("Product not in cart: {0}")]
    ProductNotInCart(ProductId),

    /// The target line is missing or the requested amount is not positive.
    #[error("Invalid quantity update for product {product_id}: requested {amount}")]
    InvalidUpdate { product_id: ProductId, amount: i64 },

    /// Requested amount exceeds available stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Stock could not be checked.
    #[error("Failed to check stock for {product_id}: {source}")]
    StockCheckFailed {
        product_id: ProductId,
        #[source]
        source: SourceError,
    },

    /// The cart kept changing underneath the operation.
    #[error("Cart changed concurrently while updating {product_id} ({attempts} attempts)")]
    ConcurrentModification { product_id: ProductId, attempts: u32 },
}

impl CartError {
    /// Product the failed operation targeted.
    pub fn product_id(&self) -> ProductId {
        match self {
            CartError::ProductFetchFailed { product_id, .. }
            | CartError::InvalidUpdate { product_id, .. }
            | CartError::OutOfStock { product_id, .. }
            | CartError::StockCheckFailed { product_id, .. }
            | CartError::ConcurrentModification { product_id, .. } => *product_id,
            CartError::ProductNotInCart(product_id) => *product_id,
        }
    }

    /// Short message suitable for showing to a shopper.
    pub fn user_message(&self) -> &'static str {
        match self {
            CartError::ProductFetchFailed { .. } => "Error adding product",
            CartError::ProductNotInCart(_) => "Error removing product",
            CartError::InvalidUpdate { .. } => "Error changing product quantity",
            CartError::OutOfStock { .. } => "Requested quantity is out of stock",
            CartError::StockCheckFailed { .. } => "Could not check product stock",
            CartError::ConcurrentModification { .. } => "Cart changed, please try again",
        }
    }
}

/// Reasons a list of lines is not a valid cart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidCart {
    /// Two lines share a product id.
    #[error("Duplicate product in cart: {0}")]
    DuplicateProduct(ProductId),

    /// A line holds zero or a negative amount.
    #[error("Non-positive amount {amount} for product {product_id}")]
    NonPositiveAmount { product_id: ProductId, amount: i64 },
}
