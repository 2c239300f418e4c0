//! OmniStore storefront core.
//!
//! Wires the catalog, OTP gate, sessions, cart and checkout engines over one
//! key-value store, and owns the ambient pieces around them:
//!
//! - [`StoreConfig`]: TOML/JSON file plus `OMNISTORE_*` environment overrides
//! - [`init_logging`]: `tracing` subscriber with human or JSON output
//! - [`Storefront`] / [`ShopperSession`]: the facade a UI drives
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_core::{Storefront, StoreConfig};
//!
//! let store = Storefront::open(StoreConfig::default()).await?;
//! let mut shopper = store.new_session().await?;
//!
//! let otp = shopper.send_otp("9876543210").await?;
//! shopper.verify_otp("9876543210", &otp.code.unwrap()).await?;
//! shopper.login("admin@omnistore.com", "admin123").await?;
//!
//! shopper.add_to_cart(&"p1".into()).await?;
//! let order = shopper.checkout().await?;
//! ```

pub mod config;
mod error;
pub mod logging;
mod storefront;

pub use config::{Backend, ConfigError, StoreConfig};
pub use error::StoreError;
pub use logging::{init_logging, LogFormat};
pub use storefront::{ShopperSession, Storefront, StorefrontBuilder};

// Re-exported so embedders need only this crate.
pub use omni_auth;
pub use omni_cache;
pub use omni_commerce;
