//! Shopping cart module.
//!
//! [`Cart`] is the pure line-item state; [`CartEngine`] binds it to a
//! session, the catalog and storage.

mod cart;
mod engine;

pub use cart::{Cart, CartLine};
pub use engine::CartEngine;
