//! Order commit: stock reservation, order persistence and cart clearing.

use omni_cache::{cache_key, Cache, CacheError};
use tracing::instrument;

use crate::cart::CartEngine;
use crate::catalog::CatalogStore;
use crate::checkout::{Order, OrderLine};
use crate::clock::SharedClock;
use crate::error::CommerceError;
use crate::ids::{OrderId, ProductId, UserId};

/// Attempts at finding an unused order id before giving up.
pub const MAX_ORDER_ID_ATTEMPTS: u32 = 5;

/// Turns carts and single products into committed orders.
///
/// A commit reserves stock line by line, then writes the order with a
/// create-if-absent. If a reservation fails the earlier ones are released;
/// if the order write fails every reservation is released. Either way the
/// caller sees stock and cart as they were.
#[derive(Clone)]
pub struct CheckoutEngine {
    catalog: CatalogStore,
    cache: Cache,
    clock: SharedClock,
}

impl std::fmt::Debug for CheckoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutEngine").finish_non_exhaustive()
    }
}

impl CheckoutEngine {
    pub fn new(catalog: CatalogStore, cache: Cache, clock: SharedClock) -> Self {
        Self {
            catalog,
            cache,
            clock,
        }
    }

    fn order_key(user: &UserId, order: &OrderId) -> String {
        cache_key!("order", user, order)
    }

    /// Commit every cart line as one order, then empty the cart.
    #[instrument(skip(self, cart), fields(session = %cart.session_id()))]
    pub async fn checkout(
        &self,
        user: Option<&UserId>,
        cart: &mut CartEngine,
    ) -> Result<Order, CommerceError> {
        let user = user.ok_or(CommerceError::NoIdentity)?;
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let lines = cart
            .lines()
            .iter()
            .map(OrderLine::from_cart_line)
            .collect::<Result<Vec<_>, _>>()?;

        let order = self.commit(user, lines).await?;

        if let Err(e) = cart.clear().await {
            // The order is committed; a stale persisted cart must not undo that.
            tracing::error!(order_id = %order.id, error = %e, "failed to clear cart after checkout");
            cart.forget();
        }

        Ok(order)
    }

    /// Buy `quantity` units of one product without touching the cart.
    #[instrument(skip(self))]
    pub async fn buy_now(
        &self,
        user: Option<&UserId>,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Order, CommerceError> {
        let user = user.ok_or(CommerceError::NoIdentity)?;
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let product = self.catalog.get_by_id(product_id).await?;
        if !product.is_in_stock() {
            return Err(CommerceError::OutOfStock(product_id.to_string()));
        }

        let line = OrderLine::new(product.id, product.name, quantity, product.price)?;
        self.commit(user, vec![line]).await
    }

    /// Orders placed by `user`, newest first.
    pub async fn orders_for(&self, user: &UserId) -> Result<Vec<Order>, CommerceError> {
        let prefix = format!("{}:", cache_key!("order", user));
        let mut orders: Vec<Order> = self.cache.scan(&prefix).await?;
        orders.sort_by(|a, b| {
            b.ordered_at
                .cmp(&a.ordered_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(orders)
    }

    pub async fn get_order(&self, user: &UserId, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.cache
            .get(&Self::order_key(user, order_id))
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))
    }

    async fn commit(&self, user: &UserId, lines: Vec<OrderLine>) -> Result<Order, CommerceError> {
        let mut reserved: Vec<(ProductId, i64)> = Vec::with_capacity(lines.len());

        for line in &lines {
            match self.catalog.reserve_stock(&line.product_id, line.quantity).await {
                Ok(_) => reserved.push((line.product_id.clone(), line.quantity)),
                Err(e) => {
                    tracing::warn!(product_id = %line.product_id, error = %e, "stock reservation failed");
                    self.release(&reserved).await;
                    return Err(e);
                }
            }
        }

        match self.persist_order(user, lines).await {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %user,
                    total = order.total.amount(),
                    items = order.item_count(),
                    "order committed"
                );
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(error = %e, "order write failed, releasing stock");
                self.release(&reserved).await;
                Err(e)
            }
        }
    }

    async fn persist_order(
        &self,
        user: &UserId,
        lines: Vec<OrderLine>,
    ) -> Result<Order, CommerceError> {
        let ordered_at = self.clock.now();

        for attempt in 0..MAX_ORDER_ID_ATTEMPTS {
            let order = Order::new(OrderId::generate(), user.clone(), ordered_at, lines.clone())?;
            if self
                .cache
                .insert_new(&Self::order_key(user, &order.id), &order)
                .await?
            {
                return Ok(order);
            }
            tracing::debug!(order_id = %order.id, attempt, "order id taken, regenerating");
        }

        Err(CacheError::ConcurrentModification("no unused order id found".to_string()).into())
    }

    /// Put reserved units back. Failures are logged; nothing else can be done.
    async fn release(&self, reserved: &[(ProductId, i64)]) {
        for (product_id, quantity) in reserved {
            if let Err(e) = self.catalog.adjust_stock(product_id, *quantity).await {
                tracing::error!(product_id = %product_id, quantity, error = %e, "failed to release reserved stock");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::clock::ManualClock;
    use crate::money::Money;
    use chrono::Duration;
    use omni_cache::flaky::FlakyStore;
    use omni_cache::{KvStore, MemoryStore};
    use std::sync::Arc;

    struct Fixture {
        catalog: CatalogStore,
        cache: Cache,
        checkout: CheckoutEngine,
        clock: ManualClock,
    }

    async fn fixture(store: Arc<dyn KvStore>) -> Fixture {
        let cache = Cache::new(store);
        let catalog = CatalogStore::new(cache.clone());
        catalog
            .seed_if_empty(vec![
                Product::new("p1", "Lays Classic Salted", 20, "chips", 85, 100),
                Product::new("p3", "Uncle Chips Plain", 15, "chips", 12, 100),
                Product::new("p0", "Sold Out", 10, "chips", 0, 100),
                Product::new("p9", "Last One", 99, "misc", 1, 100),
            ])
            .await
            .unwrap();
        let clock = ManualClock::default();
        let checkout = CheckoutEngine::new(catalog.clone(), cache.clone(), Arc::new(clock.clone()));
        Fixture {
            catalog,
            cache,
            checkout,
            clock,
        }
    }

    async fn stock(f: &Fixture, id: &str) -> i64 {
        f.catalog.get_by_id(&id.into()).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_commits_order() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let user = UserId::new("user1");
        let mut cart = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        cart.add(&"p1".into()).await.unwrap();
        cart.add(&"p1".into()).await.unwrap();

        let order = f.checkout.checkout(Some(&user), &mut cart).await.unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_name, "Lays Classic Salted");
        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(order.lines[0].line_total, Money::new(40));
        assert_eq!(order.total, Money::new(40));
        assert!(order.id.as_str().starts_with("ORD-"));
        assert_eq!(stock(&f, "p1").await, 83);
        assert!(cart.is_empty());

        let reloaded = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        assert!(reloaded.is_empty());
        assert_eq!(f.checkout.get_order(&user, &order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_checkout_requires_identity_and_lines() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let mut cart = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();

        assert!(matches!(
            f.checkout.checkout(Some(&"user1".into()), &mut cart).await,
            Err(CommerceError::EmptyCart)
        ));

        cart.add(&"p1".into()).await.unwrap();
        assert!(matches!(
            f.checkout.checkout(None, &mut cart).await,
            Err(CommerceError::NoIdentity)
        ));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(stock(&f, "p1").await, 85);
    }

    #[tokio::test]
    async fn test_buy_now_out_of_stock() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let user = UserId::new("user1");

        let err = f
            .checkout
            .buy_now(Some(&user), &"p0".into(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock(_)));
        assert_eq!(stock(&f, "p0").await, 0);
        assert!(f.checkout.orders_for(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_buy_now_leaves_cart_alone() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let user = UserId::new("user1");
        let mut cart = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        cart.add(&"p1".into()).await.unwrap();

        let order = f.checkout.buy_now(Some(&user), &"p3".into(), 1).await.unwrap();
        assert_eq!(order.total, Money::new(15));
        assert_eq!(stock(&f, "p3").await, 11);
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_reservation_rolls_back_earlier_lines() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let mut cart = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        cart.add(&"p1".into()).await.unwrap();
        cart.add(&"p9".into()).await.unwrap();

        // Another shopper takes the last unit of p9 first.
        f.catalog.reserve_stock(&"p9".into(), 1).await.unwrap();

        let err = f
            .checkout
            .checkout(Some(&"user1".into()), &mut cart)
            .await
            .unwrap_err();
        assert!(err.is_stock_conflict());
        assert_eq!(stock(&f, "p1").await, 85);
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_order_write_restores_stock_and_cart() {
        let inner = MemoryStore::new();
        let flaky = Arc::new(FlakyStore::new(Arc::new(inner.clone())).fail_writes_to("order:"));
        let f = fixture(flaky).await;
        let user = UserId::new("user1");
        let mut cart = CartEngine::load("s1".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        cart.add(&"p1".into()).await.unwrap();
        cart.add(&"p3".into()).await.unwrap();
        let before = cart.cart().clone();

        let err = f.checkout.checkout(Some(&user), &mut cart).await.unwrap_err();
        assert!(matches!(err, CommerceError::Storage(_)));

        assert_eq!(stock(&f, "p1").await, 85);
        assert_eq!(stock(&f, "p3").await, 12);
        assert_eq!(cart.cart(), &before);
        assert!(f.checkout.orders_for(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_for_last_unit() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let mut cart_a = CartEngine::load("sa".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        let mut cart_b = CartEngine::load("sb".into(), f.catalog.clone(), f.cache.clone())
            .await
            .unwrap();
        cart_a.add(&"p9".into()).await.unwrap();
        cart_b.add(&"p9".into()).await.unwrap();

        let user_a = UserId::new("alice");
        let user_b = UserId::new("bob");
        let (a, b) = tokio::join!(
            f.checkout.checkout(Some(&user_a), &mut cart_a),
            f.checkout.checkout(Some(&user_b), &mut cart_b),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(failure.is_stock_conflict());
        assert_eq!(stock(&f, "p9").await, 0);
    }

    #[tokio::test]
    async fn test_orders_for_newest_first() {
        let f = fixture(Arc::new(MemoryStore::new())).await;
        let user = UserId::new("user1");

        let first = f.checkout.buy_now(Some(&user), &"p1".into(), 1).await.unwrap();
        f.clock.advance(Duration::minutes(5));
        let second = f.checkout.buy_now(Some(&user), &"p3".into(), 2).await.unwrap();
        f.checkout
            .buy_now(Some(&"someone-else".into()), &"p1".into(), 1)
            .await
            .unwrap();

        let orders = f.checkout.orders_for(&user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
        assert!(orders.iter().all(Order::is_consistent));
    }
}
