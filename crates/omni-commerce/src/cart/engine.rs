//! Session cart backed by the catalog and durable storage.

use omni_cache::{cache_key, Cache, SessionId};
use tracing::instrument;

use crate::cart::{Cart, CartLine};
use crate::catalog::CatalogStore;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;

/// The cart of one shopper session.
///
/// Every mutation is applied to a copy, written to `cart:{session}`, and
/// only then swapped in, so a failed write leaves the cart exactly as it
/// was.
#[derive(Debug)]
pub struct CartEngine {
    session_id: SessionId,
    catalog: CatalogStore,
    cache: Cache,
    cart: Cart,
}

impl CartEngine {
    /// Restore the persisted cart for `session_id`, or start an empty one.
    pub async fn load(
        session_id: SessionId,
        catalog: CatalogStore,
        cache: Cache,
    ) -> Result<Self, CommerceError> {
        let cart = cache
            .get::<Cart>(&Self::cart_key(&session_id))
            .await?
            .unwrap_or_default();

        Ok(Self {
            session_id,
            catalog,
            cache,
            cart,
        })
    }

    fn cart_key(session_id: &SessionId) -> String {
        cache_key!("cart", session_id)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn total(&self) -> Result<Money, CommerceError> {
        self.cart.total()
    }

    pub fn item_count(&self) -> i64 {
        self.cart.item_count()
    }

    /// Add one unit of a product, checked against its latest stock.
    ///
    /// Returns `Ok(false)` when the line is already at the stock ceiling.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn add(&mut self, product_id: &ProductId) -> Result<bool, CommerceError> {
        let product = self.catalog.get_by_id(product_id).await?;

        let mut next = self.cart.clone();
        if !next.add(&product)? {
            tracing::debug!(stock = product.stock, "line already at stock ceiling");
            return Ok(false);
        }

        self.commit(next).await?;
        tracing::debug!(quantity = self.cart.quantity_of(product_id), "added to cart");
        Ok(true)
    }

    /// Set a line's quantity, clamped to the latest stock. `quantity <= 0`
    /// removes the line.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<i64, CommerceError> {
        let mut next = self.cart.clone();

        let changed = if quantity <= 0 {
            next.remove(product_id)
        } else {
            let stock = match self.catalog.get(product_id).await? {
                Some(product) => product.stock,
                // Product left the catalog: nothing can be bought.
                None => 0,
            };
            next.set_quantity(product_id, quantity, stock)
        };

        if changed {
            self.commit(next).await?;
        }

        let resulting = self.cart.quantity_of(product_id);
        tracing::debug!(requested = quantity, resulting, "cart quantity set");
        Ok(resulting)
    }

    /// Remove a line. Removing an absent product is a no-op.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn remove(&mut self, product_id: &ProductId) -> Result<(), CommerceError> {
        let mut next = self.cart.clone();
        if next.remove(product_id) {
            self.commit(next).await?;
            tracing::debug!("removed from cart");
        }
        Ok(())
    }

    /// Empty the cart.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn clear(&mut self) -> Result<(), CommerceError> {
        self.cache.delete(&Self::cart_key(&self.session_id)).await?;
        self.cart.clear();
        Ok(())
    }

    /// Drop the in-memory lines without touching storage.
    pub(crate) fn forget(&mut self) {
        self.cart.clear();
    }

    async fn commit(&mut self, next: Cart) -> Result<(), CommerceError> {
        self.cache
            .set(&Self::cart_key(&self.session_id), &next)
            .await?;
        self.cart = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use omni_cache::flaky::FlakyStore;
    use omni_cache::{KvStore, MemoryStore};
    use std::sync::Arc;

    async fn setup(store: Arc<dyn KvStore>) -> (CatalogStore, Cache) {
        let cache = Cache::new(store);
        let catalog = CatalogStore::new(cache.clone());
        catalog
            .seed_if_empty(vec![
                Product::new("p1", "Lays Classic Salted", 20, "chips", 85, 100),
                Product::new("p3", "Uncle Chips Plain", 15, "chips", 12, 100),
                Product::new("p0", "Sold Out", 10, "chips", 0, 100),
            ])
            .await
            .unwrap();
        (catalog, cache)
    }

    #[tokio::test]
    async fn test_add_twice_and_total() {
        let (catalog, cache) = setup(Arc::new(MemoryStore::new())).await;
        let mut cart = CartEngine::load("s1".into(), catalog, cache).await.unwrap();

        cart.add(&"p1".into()).await.unwrap();
        cart.add(&"p1".into()).await.unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total().unwrap(), Money::new(40));
    }

    #[tokio::test]
    async fn test_set_quantity_clamps_to_latest_stock() {
        let (catalog, cache) = setup(Arc::new(MemoryStore::new())).await;
        let mut cart = CartEngine::load("s1".into(), catalog, cache)
            .await
            .unwrap();

        cart.add(&"p3".into()).await.unwrap();
        let quantity = cart.set_quantity(&"p3".into(), 50).await.unwrap();
        assert_eq!(quantity, 12);
    }

    #[tokio::test]
    async fn test_add_refuses_out_of_stock_and_missing() {
        let (catalog, cache) = setup(Arc::new(MemoryStore::new())).await;
        let mut cart = CartEngine::load("s1".into(), catalog, cache).await.unwrap();

        assert!(matches!(
            cart.add(&"p0".into()).await,
            Err(CommerceError::OutOfStock(_))
        ));
        assert!(matches!(
            cart.add(&"nope".into()).await,
            Err(CommerceError::ProductNotFound(_))
        ));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_cart_survives_reload() {
        let (catalog, cache) = setup(Arc::new(MemoryStore::new())).await;
        {
            let mut cart = CartEngine::load("s1".into(), catalog.clone(), cache.clone())
                .await
                .unwrap();
            cart.add(&"p1".into()).await.unwrap();
            cart.add(&"p3".into()).await.unwrap();
            cart.remove(&"p3".into()).await.unwrap();
        }

        let cart = CartEngine::load("s1".into(), catalog.clone(), cache.clone())
            .await
            .unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product.id.as_str(), "p1");

        let other = CartEngine::load("s2".into(), catalog, cache).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_cart_unchanged() {
        let inner = MemoryStore::new();
        let flaky = Arc::new(FlakyStore::new(Arc::new(inner.clone())).fail_writes_to("cart:"));
        flaky.set_armed(false);
        let (catalog, cache) = setup(flaky.clone()).await;

        let mut cart = CartEngine::load("s1".into(), catalog, cache).await.unwrap();
        cart.add(&"p1".into()).await.unwrap();

        flaky.set_armed(true);
        let err = cart.add(&"p1".into()).await.unwrap_err();
        assert!(matches!(err, CommerceError::Storage(_)));
        assert_eq!(cart.item_count(), 1);

        assert!(cart.clear().await.is_err());
        assert_eq!(cart.item_count(), 1);
    }
}
