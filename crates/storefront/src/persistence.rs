//! Cart persistence on top of a key-value storage slot.
//!
//! The cart is stored as one JSON document under [`CART_STORAGE_KEY`]; the
//! remote cart ID lives under [`REMOTE_CART_ID_KEY`]. Loading never fails:
//! a missing or unreadable document yields an empty cart.

use std::sync::Arc;

use storefront_cart_core::{Cart, PricingPolicy, RemoteCartId};
use tracing::warn;

use crate::storage::{KeyValueStorage, StorageError};

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "storefront.cart";

/// Storage key holding the remote cart ID.
pub const REMOTE_CART_ID_KEY: &str = "storefront.remote_cart_id";

/// Reads and writes the cart and remote cart ID.
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn KeyValueStorage>,
    policy: PricingPolicy,
}

impl CartPersistence {
    /// Create a persistence adapter over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, policy: PricingPolicy) -> Self {
        Self { storage, policy }
    }

    /// The underlying storage handle.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Load the persisted cart, or an empty cart if absent or corrupt.
    #[must_use]
    pub fn load(&self) -> Cart {
        match self.storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => self.parse_cart(&raw).unwrap_or_default(),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                Cart::new()
            }
        }
    }

    /// Parse a serialized cart, normalizing its lines and totals.
    ///
    /// Zero-quantity lines are dropped and duplicate lines merged. Returns
    /// `None` (after logging) if the document is not a valid cart.
    #[must_use]
    pub fn parse_cart(&self, raw: &str) -> Option<Cart> {
        match serde_json::from_str::<Cart>(raw) {
            Ok(mut cart) => {
                cart.normalize(&self.policy);
                Some(cart)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unparsable persisted cart");
                None
            }
        }
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;
        self.storage.set(CART_STORAGE_KEY, &raw)
    }

    /// The recorded remote cart ID, if any.
    #[must_use]
    pub fn load_remote_id(&self) -> Option<RemoteCartId> {
        match self.storage.get(REMOTE_CART_ID_KEY) {
            Ok(id) => id
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(RemoteCartId::new),
            Err(e) => {
                warn!(error = %e, "Failed to read remote cart ID");
                None
            }
        }
    }

    /// Record the remote cart ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save_remote_id(&self, id: &RemoteCartId) -> Result<(), StorageError> {
        self.storage.set(REMOTE_CART_ID_KEY, id.as_str())
    }

    /// Forget the remote cart ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn clear_remote_id(&self) -> Result<(), StorageError> {
        self.storage.remove(REMOTE_CART_ID_KEY)
    }
}
