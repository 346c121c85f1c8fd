//! Shopping cart module.
//!
//! Contains the cart snapshot types, the notice side channel and the store
//! that mutates, persists and publishes the cart.

mod cart;
mod notify;
mod store;

pub use cart::{Cart, CartLine};
pub use notify::{CollectingNotifier, NoopNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use store::{
    CartStore, StoreConfig, UpdateProductAmount, DEFAULT_MAX_COMMIT_RETRIES, DEFAULT_NAMESPACE,
};
