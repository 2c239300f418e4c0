//! Persistent product catalog.

use std::cmp::Ordering;

use omni_cache::{cache_key, Cache, CacheError};
use tracing::instrument;

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::ProductId;

const PRODUCT_PREFIX: &str = "product";

/// The shared product catalog.
///
/// Stock changes are read-modify-write loops over the latest persisted
/// record, so concurrent checkouts in different sessions never overwrite
/// each other's decrement.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    cache: Cache,
}

impl CatalogStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    fn product_key(id: &ProductId) -> String {
        cache_key!(PRODUCT_PREFIX, id)
    }

    /// All products, sorted by id (numeric suffixes compare as numbers).
    pub async fn list(&self) -> Result<Vec<Product>, CommerceError> {
        let prefix = format!("{PRODUCT_PREFIX}:");
        let mut products: Vec<Product> = self.cache.scan(&prefix).await?;
        products.sort_by(|a, b| natural_cmp(a.id.as_str(), b.id.as_str()));
        Ok(products)
    }

    /// Look up a product, `None` if missing.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, CommerceError> {
        Ok(self.cache.get(&Self::product_key(id)).await?)
    }

    /// Look up a product that must exist.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.get(id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, CommerceError> {
        let category = category.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.category.to_lowercase() == category)
            .collect())
    }

    /// Case-insensitive substring search over name, category and description.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, CommerceError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.matches(query))
            .collect())
    }

    /// Apply `delta` to a product's stock, flooring the result at zero.
    ///
    /// A clamp means another session sold the units first; it is logged and
    /// the floored record is still written.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn adjust_stock(&self, id: &ProductId, delta: i64) -> Result<Product, CommerceError> {
        let key = Self::product_key(id);
        let mut clamped_from = None;

        let updated = self
            .cache
            .update::<Product, _, CommerceError>(&key, |current| {
                clamped_from = None;
                let mut product =
                    current.ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;

                let next = product
                    .stock
                    .checked_add(delta)
                    .ok_or(CommerceError::Overflow)?;
                if next < 0 {
                    clamped_from = Some(product.stock);
                }
                product.stock = next.max(0);
                product.max_stock = product.max_stock.max(product.stock);
                Ok(Some(product))
            })
            .await
            .map_err(|e| stock_conflict(e, id))?;

        let product = updated.ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;

        if let Some(previous) = clamped_from {
            tracing::warn!(previous, delta, "stock adjustment clamped at zero");
        } else {
            tracing::debug!(delta, stock = product.stock, "stock adjusted");
        }

        Ok(product)
    }

    /// Take `quantity` units out of stock, failing instead of clamping.
    ///
    /// Checked against the latest persisted stock, so when two sessions race
    /// for the last unit exactly one reservation succeeds.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reserve_stock(
        &self,
        id: &ProductId,
        quantity: i64,
    ) -> Result<Product, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let key = Self::product_key(id);
        let updated = self
            .cache
            .update::<Product, _, CommerceError>(&key, |current| {
                let mut product =
                    current.ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;

                if product.stock < quantity {
                    return Err(CommerceError::InsufficientStock {
                        product_id: id.to_string(),
                        requested: quantity,
                        available: product.stock,
                    });
                }
                product.stock -= quantity;
                Ok(Some(product))
            })
            .await
            .map_err(|e| stock_conflict(e, id))?;

        let product = updated.ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;
        tracing::debug!(quantity, stock = product.stock, "stock reserved");
        Ok(product)
    }

    /// Create or replace a product.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert(&self, product: Product) -> Result<Product, CommerceError> {
        product.validate()?;
        self.cache
            .set(&Self::product_key(&product.id), &product)
            .await?;
        tracing::info!(stock = product.stock, "product saved");
        Ok(product)
    }

    /// Delete a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove(&self, id: &ProductId) -> Result<(), CommerceError> {
        let key = Self::product_key(id);
        if !self.cache.exists(&key).await? {
            return Err(CommerceError::ProductNotFound(id.to_string()));
        }
        self.cache.delete(&key).await?;
        tracing::info!("product removed");
        Ok(())
    }

    /// Write `products` only when the catalog holds no products yet.
    ///
    /// Returns the number of products written.
    pub async fn seed_if_empty(&self, products: Vec<Product>) -> Result<usize, CommerceError> {
        let prefix = format!("{PRODUCT_PREFIX}:");
        if !self.cache.keys(&prefix).await?.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        for product in products {
            product.validate()?;
            if self
                .cache
                .insert_new(&Self::product_key(&product.id), &product)
                .await?
            {
                written += 1;
            }
        }

        tracing::info!(products = written, "catalog seeded");
        Ok(written)
    }
}

fn stock_conflict(err: CommerceError, id: &ProductId) -> CommerceError {
    match err {
        CommerceError::Storage(CacheError::ConcurrentModification(_)) => {
            tracing::warn!(product_id = %id, "stock update retries exhausted");
            CommerceError::StockConflict(id.to_string())
        }
        other => other,
    }
}

/// Compare ids so that "p2" sorts before "p10".
fn natural_cmp(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, Option<u64>) {
        let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (head, tail) = s.split_at(s.len() - digits);
        (head, tail.parse().ok())
    }

    let (a_head, a_num) = split(a);
    let (b_head, b_num) = split(b);
    a_head
        .cmp(b_head)
        .then_with(|| a_num.cmp(&b_num))
        .then_with(|| a.cmp(b))
}
