//! The cart store: validated mutations, persistence and publication.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use shop_cache::{cache_key, Cache};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::cart::{Cart, Notice, NoopNotifier, Notifier};
use crate::catalog::{ProductCatalog, StockChecker};
use crate::error::CartError;
use crate::ids::ProductId;

/// Namespace used for the default storage key.
pub const DEFAULT_NAMESPACE: &str = "storefront";

/// Default number of times a mutation is re-planned after losing a race.
pub const DEFAULT_MAX_COMMIT_RETRIES: u32 = 3;

/// Request to set a line's amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

impl UpdateProductAmount {
    pub fn new(product_id: impl Into<ProductId>, amount: i64) -> Self {
        Self {
            product_id: product_id.into(),
            amount,
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the cart is persisted under.
    pub storage_key: String,
    /// Send a success notice after each successful mutation.
    pub notify_success: bool,
    /// Re-plans allowed when another mutation commits first.
    pub max_commit_retries: u32,
}

impl StoreConfig {
    /// Config whose storage key lives under `namespace`.
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            storage_key: cache_key!(namespace, "cart"),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: cache_key!(DEFAULT_NAMESPACE, "cart"),
            notify_success: false,
            max_commit_retries: DEFAULT_MAX_COMMIT_RETRIES,
        }
    }
}

#[derive(Debug)]
struct Versioned {
    cart: Cart,
    version: u64,
}

/// Holds the cart and applies every change to it.
///
/// Each successful mutation writes the whole cart to the cache under
/// [`StoreConfig::storage_key`] and then publishes it to subscribers. Every
/// failure is sent to the notifier and also returned to the caller.
///
/// Mutations that wait on the catalog or stock source remember the snapshot
/// version they planned against. If another mutation commits first, the plan
/// is thrown away and rebuilt from the newer snapshot.
///
/// # Example
///
/// ```rust,ignore
/// let store = CartStore::new(Cache::open_dir(".shop")?, catalog.clone(), catalog);
/// store.add_product(ProductId::new(1)).await?;
/// store.update_product_amount(UpdateProductAmount::new(1u64, 3)).await?;
/// store.remove_product(ProductId::new(1))?;
/// ```
pub struct CartStore {
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockChecker>,
    cache: Cache,
    notifier: Arc<dyn Notifier>,
    config: StoreConfig,
    state: Mutex<Versioned>,
    publisher: watch::Sender<Cart>,
}

impl CartStore {
    /// Create a store with the default config, loading any persisted cart.
    pub fn new(
        cache: Cache,
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockChecker>,
    ) -> Self {
        Self::with_config(StoreConfig::default(), cache, catalog, stock)
    }

    /// Create a store, loading the cart persisted under `config.storage_key`.
    ///
    /// A missing or unreadable payload yields an empty cart. No catalog or
    /// stock call is made here.
    pub fn with_config(
        config: StoreConfig,
        cache: Cache,
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockChecker>,
    ) -> Self {
        let cart = load_cart(&cache, &config.storage_key);
        let (publisher, _) = watch::channel(cart.clone());
        Self {
            catalog,
            stock,
            cache,
            notifier: Arc::new(NoopNotifier),
            config,
            state: Mutex::new(Versioned { cart, version: 0 }),
            publisher,
        }
    }

    /// Set the notifier that receives shopper-facing messages.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current cart snapshot.
    pub fn cart(&self) -> Cart {
        self.state().cart.clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.publisher.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart goes through the same stock check as
    /// [`CartStore::update_product_amount`] with its amount plus one. A new
    /// product is fetched from the catalog and appended with amount 1; its
    /// stock is not checked.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let result = self
            .commit_planned(product_id, |base| self.plan_add(base, product_id))
            .await;
        self.report(result, "Product added to cart")
    }

    /// Remove a product's line.
    #[instrument(skip(self))]
    pub fn remove_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let result = {
            let mut state = self.state();
            let mut next = state.cart.clone();
            match next.remove(product_id) {
                Some(_) => Ok(self.apply(&mut state, next)),
                None => Err(CartError::ProductNotInCart(product_id)),
            }
        };
        self.report(result, "Product removed from cart")
    }

    /// Set the amount of a line already in the cart.
    ///
    /// Fails with [`CartError::InvalidUpdate`] when the product is missing or
    /// the amount is not positive, and with [`CartError::OutOfStock`] when the
    /// amount exceeds the stock reported at call time.
    #[instrument(skip(self), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(
        &self,
        update: UpdateProductAmount,
    ) -> Result<Cart, CartError> {
        let UpdateProductAmount { product_id, amount } = update;
        let result = self
            .commit_planned(product_id, |base| {
                self.plan_update(base, product_id, amount)
            })
            .await;
        self.report(result, "Product quantity updated")
    }

    async fn plan_add(&self, base: Cart, product_id: ProductId) -> Result<Cart, CartError> {
        if let Some(line) = base.line(product_id) {
            let amount = line
                .amount
                .checked_add(1)
                .ok_or(CartError::InvalidUpdate {
                    product_id,
                    amount: line.amount,
                })?;
            return self.plan_update(base, product_id, amount).await;
        }

        let product = self
            .catalog
            .fetch_product(product_id)
            .await
            .map_err(|source| CartError::ProductFetchFailed { product_id, source })?;

        let mut next = base;
        // The base snapshot has no line for this id, so the push cannot collide.
        next.push_product(product)
            .map_err(|_| CartError::InvalidUpdate {
                product_id,
                amount: 1,
            })?;
        Ok(next)
    }

    async fn plan_update(
        &self,
        base: Cart,
        product_id: ProductId,
        amount: i64,
    ) -> Result<Cart, CartError> {
        if amount <= 0 || !base.contains(product_id) {
            return Err(CartError::InvalidUpdate { product_id, amount });
        }

        let stock = self
            .stock
            .fetch_stock(product_id)
            .await
            .map_err(|source| CartError::StockCheckFailed { product_id, source })?;

        if !stock.can_fulfill(amount) {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let mut next = base;
        if !next.set_amount(product_id, amount) {
            return Err(CartError::InvalidUpdate { product_id, amount });
        }
        Ok(next)
    }

    /// Plan against the current snapshot, then commit if nothing else
    /// committed in between. Otherwise plan again from the newer snapshot.
    async fn commit_planned<F, Fut>(
        &self,
        product_id: ProductId,
        plan: F,
    ) -> Result<Cart, CartError>
    where
        F: Fn(Cart) -> Fut,
        Fut: Future<Output = Result<Cart, CartError>>,
    {
        let mut attempts = 0u32;
        loop {
            let (base, version) = {
                let state = self.state();
                (state.cart.clone(), state.version)
            };

            let next = plan(base).await?;

            {
                let mut state = self.state();
                if state.version == version {
                    return Ok(self.apply(&mut state, next));
                }
            }

            attempts += 1;
            debug!(%product_id, attempts, "cart changed during update, replanning");
            if attempts > self.config.max_commit_retries {
                return Err(CartError::ConcurrentModification {
                    product_id,
                    attempts,
                });
            }
        }
    }

    /// Persist, install and publish a new snapshot. Caller holds the lock.
    fn apply(&self, state: &mut Versioned, next: Cart) -> Cart {
        if let Err(e) = self.cache.set(&self.config.storage_key, &next) {
            warn!(key = %self.config.storage_key, error = %e, "failed to persist cart");
        }
        state.cart = next.clone();
        state.version += 1;
        debug!(version = state.version, lines = next.len(), "cart committed");
        self.publisher.send_replace(next.clone());
        next
    }

    fn report(&self, result: Result<Cart, CartError>, success: &str) -> Result<Cart, CartError> {
        match &result {
            Ok(_) if self.config.notify_success => self.notifier.notify(Notice::success(success)),
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "cart operation failed");
                self.notifier.notify(Notice::error(e.user_message()));
            }
        }
        result
    }

    fn state(&self) -> MutexGuard<'_, Versioned> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_cart(cache: &Cache, key: &str) -> Cart {
    match cache.get::<Cart>(key) {
        Ok(Some(cart)) => {
            debug!(key, lines = cart.len(), "loaded persisted cart");
            cart
        }
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable persisted cart");
            Cart::new()
        }
    }
}
