//! End-to-end behaviour of the cart store against in-memory collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use shop_cache::Cache;
use shop_commerce::prelude::*;

const KEY: &str = "storefront:cart";

fn shoe() -> Product {
    Product::new(1u64, "Shoe", Price::from_decimal(100.0))
}

fn runner() -> Product {
    Product::new(2u64, "Runner", Price::from_decimal(139.9))
}

struct Harness {
    store: CartStore,
    catalog: Arc<InMemoryCatalog>,
    cache: Cache,
    notices: Arc<CollectingNotifier>,
}

impl Harness {
    fn new(catalog: InMemoryCatalog) -> Self {
        Self::with_cache(catalog, Cache::in_memory())
    }

    fn with_cache(catalog: InMemoryCatalog, cache: Cache) -> Self {
        let catalog = Arc::new(catalog);
        let notices = Arc::new(CollectingNotifier::new());
        let store = CartStore::new(cache.clone(), catalog.clone(), catalog.clone())
            .with_notifier(notices.clone());
        Self {
            store,
            catalog,
            cache,
            notices,
        }
    }

    fn persisted(&self) -> Option<Cart> {
        self.cache.get(KEY).unwrap()
    }

    fn errors(&self) -> Vec<String> {
        self.notices
            .drain()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }
}

/// Stock source that always fails.
struct BrokenStock;

#[async_trait]
impl StockChecker for BrokenStock {
    async fn fetch_stock(&self, _product_id: ProductId) -> Result<Stock, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

/// Stock source that yields once before answering, so concurrent mutations
/// interleave at the network step.
struct SlowStock(Arc<InMemoryCatalog>);

#[async_trait]
impl StockChecker for SlowStock {
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Stock, SourceError> {
        tokio::task::yield_now().await;
        self.0.fetch_stock(product_id).await
    }
}

#[tokio::test]
async fn test_add_new_product_to_empty_cart() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 5));

    let cart = h.store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(cart.len(), 1);
    let line = &cart.lines()[0];
    assert_eq!(line.id(), ProductId::new(1));
    assert_eq!(line.product.name, "Shoe");
    assert_eq!(line.product.price, Price::from_cents(10000));
    assert_eq!(line.amount, 1);
    assert_eq!(h.persisted(), Some(cart));
    assert!(h.errors().is_empty());
}

#[tokio::test]
async fn test_add_new_product_skips_stock_check() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 0));

    let cart = h.store.add_product(ProductId::new(1)).await.unwrap();
    assert_eq!(cart.line(ProductId::new(1)).unwrap().amount, 1);
}

#[tokio::test]
async fn test_add_existing_beyond_stock_is_out_of_stock() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 1));
    h.store.add_product(ProductId::new(1)).await.unwrap();

    let err = h.store.add_product(ProductId::new(1)).await.unwrap_err();

    assert_eq!(
        err,
        CartError::OutOfStock {
            product_id: ProductId::new(1),
            requested: 2,
            available: 1,
        }
    );
    assert_eq!(h.store.cart().line(ProductId::new(1)).unwrap().amount, 1);
    assert_eq!(h.persisted().unwrap().lines()[0].amount, 1);
    assert_eq!(h.errors(), vec!["Requested quantity is out of stock"]);
}

#[tokio::test]
async fn test_add_existing_increments() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 3));
    h.store.add_product(ProductId::new(1)).await.unwrap();
    h.store.add_product(ProductId::new(1)).await.unwrap();
    let cart = h.store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].amount, 3);
}

#[tokio::test]
async fn test_add_unknown_product_fails_fetch() {
    let h = Harness::new(InMemoryCatalog::new());

    let err = h.store.add_product(ProductId::new(42)).await.unwrap_err();

    assert!(matches!(err, CartError::ProductFetchFailed { .. }));
    assert!(h.store.cart().is_empty());
    assert_eq!(h.persisted(), None);
    assert_eq!(h.errors(), vec!["Error adding product"]);
}

#[tokio::test]
async fn test_update_within_stock() {
    let h = Harness::new(InMemoryCatalog::new().with_product(runner(), 10));
    h.store.add_product(ProductId::new(2)).await.unwrap();
    h.store
        .update_product_amount(UpdateProductAmount::new(2u64, 3))
        .await
        .unwrap();

    let cart = h
        .store
        .update_product_amount(UpdateProductAmount::new(2u64, 5))
        .await
        .unwrap();

    assert_eq!(cart.line(ProductId::new(2)).unwrap().amount, 5);
    assert_eq!(h.persisted(), Some(cart));
}

#[tokio::test]
async fn test_update_to_zero_is_invalid() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 10));
    let before = h.store.add_product(ProductId::new(1)).await.unwrap();

    let err = h
        .store
        .update_product_amount(UpdateProductAmount::new(1u64, 0))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CartError::InvalidUpdate {
            product_id: ProductId::new(1),
            amount: 0
        }
    );
    assert_eq!(h.store.cart(), before);
    assert_eq!(h.errors(), vec!["Error changing product quantity"]);
}

#[tokio::test]
async fn test_update_missing_product_is_invalid() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 10));

    let err = h
        .store
        .update_product_amount(UpdateProductAmount::new(1u64, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::InvalidUpdate { .. }));
    assert!(h.store.cart().is_empty());
}

#[tokio::test]
async fn test_update_follows_stock_changes() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 2));
    h.store.add_product(ProductId::new(1)).await.unwrap();

    let over = UpdateProductAmount::new(1u64, 4);
    assert!(h.store.update_product_amount(over).await.is_err());

    h.catalog.set_stock(ProductId::new(1), 4);
    let cart = h.store.update_product_amount(over).await.unwrap();
    assert_eq!(cart.lines()[0].amount, 4);
}

#[tokio::test]
async fn test_stock_check_failure_leaves_cart_unchanged() {
    let catalog = Arc::new(InMemoryCatalog::new().with_product(shoe(), 10));
    let notices = Arc::new(CollectingNotifier::new());
    let store = CartStore::new(Cache::in_memory(), catalog, Arc::new(BrokenStock))
        .with_notifier(notices.clone());

    store.add_product(ProductId::new(1)).await.unwrap();
    let err = store.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(err, CartError::StockCheckFailed { .. }));
    assert_eq!(store.cart().lines()[0].amount, 1);
    assert_eq!(notices.drain()[0].message, "Could not check product stock");
}

#[tokio::test]
async fn test_remove_missing_product() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 10));
    let before = h.store.add_product(ProductId::new(1)).await.unwrap();

    let err = h.store.remove_product(ProductId::new(2)).unwrap_err();

    assert_eq!(err, CartError::ProductNotInCart(ProductId::new(2)));
    assert_eq!(h.store.cart(), before);
    assert_eq!(h.errors(), vec!["Error removing product"]);
}

#[tokio::test]
async fn test_remove_keeps_order_of_remaining_lines() {
    let catalog = InMemoryCatalog::new()
        .with_product(shoe(), 10)
        .with_product(runner(), 10)
        .with_product(Product::new(3u64, "Boot", Price::from_cents(5000)), 10);
    let h = Harness::new(catalog);
    for id in [3, 1, 2] {
        h.store.add_product(ProductId::new(id)).await.unwrap();
    }

    let cart = h.store.remove_product(ProductId::new(1)).unwrap();

    assert_eq!(cart.product_ids(), vec![ProductId::new(3), ProductId::new(2)]);
    assert_eq!(h.persisted(), Some(cart));
}

#[tokio::test]
async fn test_never_duplicates_lines() {
    let h = Harness::new(
        InMemoryCatalog::new()
            .with_product(shoe(), 3)
            .with_product(runner(), 3),
    );
    for id in [1, 2, 1, 1, 2, 1, 2, 2] {
        let _ = h.store.add_product(ProductId::new(id)).await;
    }
    let _ = h.store.remove_product(ProductId::new(1));
    let _ = h.store.add_product(ProductId::new(1)).await;

    let cart = h.store.cart();
    let mut ids = cart.product_ids();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), cart.len());
    assert_eq!(cart.product_ids(), vec![ProductId::new(2), ProductId::new(1)]);
    assert_eq!(cart.line(ProductId::new(2)).unwrap().amount, 3);
}

#[tokio::test]
async fn test_success_notices_when_enabled() {
    let catalog = Arc::new(InMemoryCatalog::new().with_product(shoe(), 3));
    let notices = Arc::new(CollectingNotifier::new());
    let config = StoreConfig {
        notify_success: true,
        ..StoreConfig::default()
    };
    let store = CartStore::with_config(config, Cache::in_memory(), catalog.clone(), catalog)
        .with_notifier(notices.clone());

    store.add_product(ProductId::new(1)).await.unwrap();
    store.remove_product(ProductId::new(1)).unwrap();

    let notices = notices.drain();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Success));
}

#[tokio::test]
async fn test_subscribers_see_each_snapshot() {
    let h = Harness::new(InMemoryCatalog::new().with_product(shoe(), 3));
    let mut rx = h.store.subscribe();
    assert!(rx.borrow().is_empty());

    h.store.add_product(ProductId::new(1)).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    let _ = h.store.remove_product(ProductId::new(9));
    assert!(!rx.has_changed().unwrap());

    h.store.remove_product(ProductId::new(1)).unwrap();
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_cart_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = InMemoryCatalog::new()
        .with_product(shoe(), 5)
        .with_product(runner(), 5);

    let first = Harness::with_cache(catalog, Cache::open_dir(dir.path()).unwrap());
    first.store.add_product(ProductId::new(2)).await.unwrap();
    first.store.add_product(ProductId::new(1)).await.unwrap();
    let saved = first
        .store
        .update_product_amount(UpdateProductAmount::new(2u64, 4))
        .await
        .unwrap();
    drop(first);

    let catalog = Arc::new(InMemoryCatalog::new());
    let reloaded = CartStore::new(
        Cache::open_dir(dir.path()).unwrap(),
        catalog.clone(),
        catalog,
    );
    assert_eq!(reloaded.cart(), saved);
    assert_eq!(
        reloaded.cart().product_ids(),
        vec![ProductId::new(2), ProductId::new(1)]
    );
}

#[tokio::test]
async fn test_concurrent_adds_are_not_lost() {
    let catalog = Arc::new(InMemoryCatalog::new().with_product(shoe(), 10));
    let store = CartStore::new(
        Cache::in_memory(),
        catalog.clone(),
        Arc::new(SlowStock(catalog.clone())),
    );
    store.add_product(ProductId::new(1)).await.unwrap();

    let (a, b) = tokio::join!(
        store.add_product(ProductId::new(1)),
        store.add_product(ProductId::new(1))
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(store.cart().lines()[0].amount, 3);
}

#[tokio::test]
async fn test_concurrent_conflict_without_retries() {
    let catalog = Arc::new(InMemoryCatalog::new().with_product(shoe(), 10));
    let config = StoreConfig {
        max_commit_retries: 0,
        ..StoreConfig::default()
    };
    let store = CartStore::with_config(
        config,
        Cache::in_memory(),
        catalog.clone(),
        Arc::new(SlowStock(catalog.clone())),
    );
    store.add_product(ProductId::new(1)).await.unwrap();

    let (a, b) = tokio::join!(
        store.update_product_amount(UpdateProductAmount::new(1u64, 4)),
        store.update_product_amount(UpdateProductAmount::new(1u64, 6))
    );

    // join! does not fix which branch is polled first, so either may win.
    let (winner, loser) = match (a, b) {
        (Ok(cart), Err(err)) => (cart, err),
        (Err(err), Ok(cart)) => (cart, err),
        (a, b) => panic!("expected exactly one commit, got {:?} and {:?}", a, b),
    };
    assert!(matches!(
        loser,
        CartError::ConcurrentModification { attempts: 1, .. }
    ));

    let won = winner.lines()[0].amount;
    assert!(won == 4 || won == 6);
    assert_eq!(store.cart().lines()[0].amount, won);
}
