//! Storefront error type.

use omni_auth::AuthError;
use omni_cache::{CacheError, ErrorKind};
use omni_commerce::CommerceError;
use thiserror::Error;

use crate::config::ConfigError;

/// Any error surfaced by the storefront facade.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The global subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Commerce(e) => e.kind(),
            StoreError::Auth(e) => e.kind(),
            StoreError::Cache(e) => e.kind(),
            StoreError::Config(_) => ErrorKind::Validation,
            StoreError::Logging(_) => ErrorKind::Transport,
        }
    }

    /// Lost a race for stock.
    pub fn is_stock_conflict(&self) -> bool {
        matches!(self, StoreError::Commerce(e) if e.is_stock_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_delegates() {
        let err: StoreError = CommerceError::InsufficientStock {
            product_id: "p1".into(),
            requested: 1,
            available: 0,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_stock_conflict());

        let err: StoreError = AuthError::Expired.into();
        assert_eq!(err.kind(), ErrorKind::Expired);
        assert!(!err.is_stock_conflict());

        let err = StoreError::Config(ConfigError::InvalidEnvVar("X".into(), "y".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
