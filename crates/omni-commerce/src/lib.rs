//! Commerce domain for OmniStore.
//!
//! - **Catalog**: products, stock classification, the shared [`CatalogStore`]
//! - **Cart**: per-session line items behind [`CartEngine`]
//! - **Checkout**: [`CheckoutEngine`] commits carts and single products into
//!   immutable orders, and [`PaymentIntent`] formats UPI deep links
//!
//! All state lives in an [`omni_cache::Cache`], so the engines are cheap
//! handles that can be cloned into every session.
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_commerce::prelude::*;
//!
//! let catalog = CatalogStore::new(cache.clone());
//! catalog.seed_if_empty(seed_products()).await?;
//!
//! let mut cart = CartEngine::load(session_id, catalog.clone(), cache.clone()).await?;
//! cart.add(&ProductId::new("p1")).await?;
//!
//! let checkout = CheckoutEngine::new(catalog, cache, system_clock());
//! let order = checkout.checkout(Some(&user_id), &mut cart).await?;
//! println!("Total: {}", order.total);
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub use omni_cache::clock;
pub mod error;
pub mod ids;
pub mod money;

pub use cart::{Cart, CartEngine, CartLine};
pub use catalog::{CatalogStore, Product, StockBand, StockLevel};
pub use checkout::{CheckoutEngine, Order, OrderLine, OrderStatus, Payee, PaymentApp, PaymentIntent};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::CommerceError;
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Catalog
    pub use crate::catalog::{seed_products, CatalogStore, Product, StockBand, StockLevel};

    // Cart
    pub use crate::cart::{Cart, CartEngine, CartLine};

    // Checkout
    pub use crate::checkout::{
        CheckoutEngine, Order, OrderLine, OrderStatus, Payee, PaymentApp, PaymentIntent,
    };

    pub use crate::clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
}
