//! Commerce error types.

use omni_cache::{CacheError, ErrorKind};
use thiserror::Error;

/// Errors that can occur in catalog, cart and checkout operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Malformed input, e.g. a negative price.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The product has no stock at all.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Stock fell below the requested quantity before it could be reserved.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Stock update lost every compare-and-swap attempt.
    #[error("Stock conflict: {0}")]
    StockConflict(String),

    /// Checkout attempted without an authenticated user.
    #[error("No authenticated user")]
    NoIdentity,

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] CacheError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CommerceError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::Validation(_)
            | CommerceError::InvalidQuantity(_)
            | CommerceError::OutOfStock(_)
            | CommerceError::NoIdentity
            | CommerceError::EmptyCart
            | CommerceError::Overflow => ErrorKind::Validation,
            CommerceError::ProductNotFound(_) | CommerceError::OrderNotFound(_) => {
                ErrorKind::NotFound
            }
            CommerceError::InsufficientStock { .. } | CommerceError::StockConflict(_) => {
                ErrorKind::Conflict
            }
            CommerceError::Storage(e) => match e.kind() {
                ErrorKind::Conflict => ErrorKind::Conflict,
                _ => ErrorKind::Transport,
            },
            CommerceError::Serialization(_) => ErrorKind::Transport,
        }
    }

    /// True when the failure is a stock race or shortage.
    pub fn is_stock_conflict(&self) -> bool {
        matches!(
            self,
            CommerceError::InsufficientStock { .. } | CommerceError::StockConflict(_)
        )
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
