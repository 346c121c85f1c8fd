//! Product catalog and stock lookups over the storefront HTTP API.

use async_trait::async_trait;
use shop_commerce::catalog::{Product, ProductCatalog, Stock, StockChecker};
use shop_commerce::{ProductId, SourceError};
use tracing::instrument;

use crate::client::{FetchClient, FetchError, FetchPolicy};

/// Serves `GET /products/{id}` and `GET /stock/{id}` from the storefront API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: FetchClient,
}

impl HttpCatalog {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Connect to `base_url` with the given policy.
    pub fn connect(base_url: &str, policy: FetchPolicy) -> Result<Self, FetchError> {
        Ok(Self::new(FetchClient::with_policy(base_url, policy)?))
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }
}

fn source_error(product_id: ProductId, err: FetchError) -> SourceError {
    match err {
        FetchError::Http { status: 404, .. } => SourceError::NotFound(product_id),
        other => SourceError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
    #[instrument(skip(self))]
    async fn fetch_product(&self, product_id: ProductId) -> Result<Product, SourceError> {
        self.client
            .get_json(&format!("products/{}", product_id))
            .await
            .map_err(|e| source_error(product_id, e))
    }
}

#[async_trait]
impl StockChecker for HttpCatalog {
    #[instrument(skip(self))]
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Stock, SourceError> {
        self.client
            .get_json(&format!("stock/{}", product_id))
            .await
            .map_err(|e| source_error(product_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_source_not_found() {
        let err = source_error(
            ProductId::new(3),
            FetchError::Http {
                status: 404,
                url: "http://x/products/3".to_string(),
            },
        );
        assert_eq!(err, SourceError::NotFound(ProductId::new(3)));
    }

    #[test]
    fn test_other_errors_are_unavailable() {
        let err = source_error(ProductId::new(3), FetchError::Timeout("slow".to_string()));
        assert!(matches!(err, SourceError::Unavailable(msg) if msg.contains("slow")));
    }
}
