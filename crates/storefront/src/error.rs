//! Unified error type for callers driving the cart engine.
//!
//! Each layer has its own error enum; [`AppError`] wraps them so a binary
//! can propagate any of them with `?`.

use storefront_cart_core::CartError;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::shopify::ShopifyError;
use crate::storage::StorageError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Checkout could not be started.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether the error reflects a fault worth reporting (as opposed to
    /// bad input from the shopper).
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Shopify(_) | Self::Checkout(CheckoutError::Unavailable(_))
        )
    }
}

/// Result alias using [`AppError`].
pub type Result<T, E = AppError> = std::result::Result<T, E>;
