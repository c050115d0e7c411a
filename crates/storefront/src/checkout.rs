//! Checkout handoff.
//!
//! Checkout is delegated to the commerce backend: the local cart is synced,
//! the remote cart's checkout URL is handed to the caller, and the local
//! cart and remote ID are cleared so the next visit starts fresh.

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::shopify::CartBackend;
use crate::sync::{CartSync, SyncOutcome};

/// Errors raised when starting checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is nothing to check out.
    #[error("Cart is empty")]
    EmptyCart,

    /// The remote cart or its checkout URL could not be obtained.
    #[error("Checkout unavailable: {0}")]
    Unavailable(String),

    /// The local cart changed while it was being pushed; nothing was cleared.
    #[error("Cart changed during checkout")]
    CartChanged,
}

impl<B: CartBackend> CartSync<B> {
    /// Sync the cart and return the backend's checkout URL.
    ///
    /// On success the local cart is emptied and the remote cart ID
    /// forgotten. On failure the local cart is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart,
    /// [`CheckoutError::Unavailable`] if the sync fails or the backend's
    /// checkout URL is not a valid URL, and [`CheckoutError::CartChanged`]
    /// if the cart was edited while it was being pushed.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<Url, CheckoutError> {
        let (outcome, pushed) = self.sync_snapshot().await;
        match outcome {
            SyncOutcome::SkippedEmpty => return Err(CheckoutError::EmptyCart),
            SyncOutcome::Failed(reason) => return Err(CheckoutError::Unavailable(reason)),
            SyncOutcome::Created(_) | SyncOutcome::Updated(_) => {}
        }

        let mirror = self
            .mirror()
            .await
            .ok_or_else(|| CheckoutError::Unavailable("no remote cart".to_string()))?;
        let url = Url::parse(&mirror.checkout_url).map_err(|e| {
            CheckoutError::Unavailable(format!("invalid checkout URL {:?}: {e}", mirror.checkout_url))
        })?;

        // Lines added mid-sync never reached the remote cart
        if !self.store().clear_if_unchanged(&pushed) {
            warn!(remote_id = %mirror.remote_id, "Cart changed during checkout, keeping it");
            return Err(CheckoutError::CartChanged);
        }
        self.reset_mirror().await;
        info!(remote_id = %mirror.remote_id, "Handed off to checkout");
        Ok(url)
    }
}
