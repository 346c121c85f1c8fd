//! Storefront API access for the cart.
//!
//! This crate provides:
//! - `FetchClient` - JSON-over-HTTP client with optional timeout and retry
//! - `HttpCatalog` - `ProductCatalog` and `StockChecker` backed by the API
//! - `TimeoutConfig` - Connect and total timeouts
//! - `RetryPolicy` - Retry strategies

mod catalog;
mod client;
mod retry;
mod timeout;

pub use catalog::*;
pub use client::*;
pub use retry::*;
pub use timeout::*;
