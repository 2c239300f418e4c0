//! Product catalog module.
//!
//! Contains the product record, stock classification, the persistent
//! catalog store and the starter catalog.

mod inventory;
mod product;
pub mod seed;
mod store;

pub use inventory::{StockBand, StockLevel, HEALTHY_STOCK_PERCENT, LOW_STOCK_PERCENT};
pub use product::Product;
pub use seed::{seed_products, CATEGORIES};
pub use store::CatalogStore;
