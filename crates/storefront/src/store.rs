//! The local cart store.
//!
//! [`CartStore`] is the authoritative copy of the shopper's cart. It is a
//! cheaply cloneable handle passed to whichever component needs the cart.
//! Every effective mutation recomputes totals, persists the cart and then
//! publishes the new snapshot to subscribers. Persistence failures are
//! logged and never fail the mutation.

use std::sync::Arc;

use storefront_cart_core::{
    Cart, CartError, CartTotals, LineItemId, PricingPolicy, ProductSummary, VariantId,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::persistence::{CART_STORAGE_KEY, CartPersistence};
use crate::storage::KeyValueStorage;

/// Handle to the local cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    policy: PricingPolicy,
    persistence: CartPersistence,
    state: watch::Sender<Cart>,
}

impl CartStore {
    /// Open the store, restoring the cart persisted in `storage`.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStorage>, policy: PricingPolicy) -> Self {
        let persistence = CartPersistence::new(storage, policy);
        let cart = persistence.load();
        debug!(items = cart.items.len(), "Cart restored from storage");

        Self {
            inner: Arc::new(CartStoreInner {
                policy,
                persistence,
                state: watch::Sender::new(cart),
            }),
        }
    }

    /// The pricing rules used for totals.
    #[must_use]
    pub fn policy(&self) -> &PricingPolicy {
        &self.inner.policy
    }

    /// The persistence adapter backing this store.
    #[must_use]
    pub fn persistence(&self) -> &CartPersistence {
        &self.inner.persistence
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to cart snapshots.
    ///
    /// The receiver starts with the current cart marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Totals recomputed from the current items.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        Cart::compute_totals(&self.inner.state.borrow().items, &self.inner.policy)
    }

    /// Add `quantity` of a product variant, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingVariant`] if no variant can be resolved and
    /// [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn add_item(
        &self,
        product: &ProductSummary,
        quantity: u32,
        variant_id: Option<&VariantId>,
    ) -> Result<LineItemId, CartError> {
        let mut result = Err(CartError::InvalidQuantity);
        self.inner.state.send_if_modified(|cart| {
            result = cart.add_item(product, quantity, variant_id, &self.inner.policy);
            self.commit(cart, result.is_ok())
        });
        result
    }

    /// Remove a line. Returns `false` if it was not in the cart.
    pub fn remove_item(&self, id: &LineItemId) -> bool {
        self.inner.state.send_if_modified(|cart| {
            let changed = cart.remove_item(id, &self.inner.policy);
            self.commit(cart, changed)
        })
    }

    /// Set a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Returns `false` if nothing changed.
    pub fn set_quantity(&self, id: &LineItemId, quantity: i64) -> bool {
        self.inner.state.send_if_modified(|cart| {
            let changed = cart.set_quantity(id, quantity, &self.inner.policy);
            self.commit(cart, changed)
        })
    }

    /// Empty the cart. Returns `false` if it was already empty.
    pub fn clear(&self) -> bool {
        self.inner.state.send_if_modified(|cart| {
            let changed = !cart.is_empty();
            if changed {
                cart.clear();
            }
            self.commit(cart, changed)
        })
    }

    /// Empty the cart only if it still equals `expected`.
    ///
    /// Returns `false`, leaving the cart untouched, if it changed since
    /// `expected` was taken.
    pub fn clear_if_unchanged(&self, expected: &Cart) -> bool {
        self.inner.state.send_if_modified(|cart| {
            let changed = !cart.is_empty() && cart == expected;
            if changed {
                cart.clear();
            }
            self.commit(cart, changed)
        })
    }

    /// Replace the cart with a snapshot written elsewhere.
    ///
    /// Subscribers are notified but nothing is persisted, since the snapshot
    /// already came from storage.
    pub fn replace_from_external(&self, mut cart: Cart) -> bool {
        cart.normalize(&self.inner.policy);
        self.inner.state.send_if_modified(|current| {
            if *current == cart {
                return false;
            }
            *current = cart;
            true
        })
    }

    /// Persist after a mutation; returns `changed` for `send_if_modified`.
    fn commit(&self, cart: &Cart, changed: bool) -> bool {
        if changed && let Err(e) = self.inner.persistence.save(cart) {
            error!(error = %e, "Failed to persist cart");
        }
        changed
    }

    /// Republish cart changes written by other storage handles.
    ///
    /// Changes from this store's own handle are ignored. A removed slot
    /// empties the cart; an unparsable value is logged and skipped. The
    /// task runs until the returned handle is aborted.
    #[must_use]
    pub fn spawn_storage_listener(&self) -> JoinHandle<()> {
        let store = self.clone();
        let storage = Arc::clone(self.inner.persistence.storage());
        let own_origin = storage.origin();
        let mut events = storage.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.origin != own_origin && event.key == CART_STORAGE_KEY => {
                        let cart = match event.new_value {
                            None => Cart::new(),
                            Some(raw) => match store.persistence().parse_cart(&raw) {
                                Some(cart) => cart,
                                None => continue,
                            },
                        };
                        if store.replace_from_external(cart) {
                            debug!("Cart replaced by external change");
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed storage events, reloading cart");
                        store.replace_from_external(store.persistence().load());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
