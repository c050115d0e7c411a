//! One-way sync of the local cart to the remote cart mirror.
//!
//! The local [`CartStore`] is authoritative. Syncing pushes its lines to a
//! remote cart on the commerce backend, creating that cart on first use and
//! recreating it when the recorded ID no longer resolves. Sync is
//! best-effort: failures are logged and reported as [`SyncOutcome::Failed`],
//! local state is never rolled back, and each call makes a single attempt.

use std::collections::HashMap;
use std::sync::Arc;

use storefront_cart_core::{Cart, RemoteCartId, VariantId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::shopify::{CartBackend, CartLineInput, CartLineUpdateInput, ShopifyCart, ShopifyError};
use crate::store::CartStore;

/// The backend-side cart last seen by a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCartMirror {
    pub remote_id: RemoteCartId,
    pub checkout_url: String,
    pub lines: Vec<crate::shopify::ShopifyCartLine>,
}

impl From<ShopifyCart> for RemoteCartMirror {
    fn from(cart: ShopifyCart) -> Self {
        Self {
            remote_id: cart.id,
            checkout_url: cart.checkout_url,
            lines: cart.lines,
        }
    }
}

/// Result of a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The local cart is empty; nothing was sent.
    SkippedEmpty,
    /// A new remote cart was created.
    Created(RemoteCartId),
    /// The recorded remote cart was brought in line with the local cart.
    Updated(RemoteCartId),
    /// The backend could not be reached or rejected the cart.
    Failed(String),
}

impl SyncOutcome {
    /// The remote cart ID after a successful sync.
    #[must_use]
    pub const fn remote_id(&self) -> Option<&RemoteCartId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            Self::SkippedEmpty | Self::Failed(_) => None,
        }
    }
}

/// Changes that bring a remote cart's lines in line with the local cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Line IDs to remove from the remote cart.
    pub remove: Vec<String>,
    /// Remote lines whose quantity differs.
    pub update: Vec<CartLineUpdateInput>,
    /// Variants missing from the remote cart.
    pub add: Vec<CartLineInput>,
}

impl ReconcilePlan {
    /// Whether the remote cart already matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.update.is_empty() && self.add.is_empty()
    }
}

/// Local lines as backend inputs, one per variant, in cart order.
#[must_use]
pub fn local_lines(cart: &Cart) -> Vec<CartLineInput> {
    let mut lines: Vec<CartLineInput> = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        match lines
            .iter_mut()
            .find(|line| line.merchandise_id == item.variant_id)
        {
            Some(line) => line.quantity += i64::from(item.quantity),
            None => lines.push(CartLineInput {
                merchandise_id: item.variant_id.clone(),
                quantity: i64::from(item.quantity),
            }),
        }
    }
    lines
}

/// Plan the remote changes needed to mirror `local`.
///
/// The first remote line for each local variant is kept (updating its
/// quantity if needed); duplicate and remote-only lines are removed;
/// variants the remote cart lacks are added.
#[must_use]
pub fn plan_reconciliation(local: &Cart, remote: &ShopifyCart) -> ReconcilePlan {
    let wanted = local_lines(local);
    let mut pending: HashMap<VariantId, i64> = wanted
        .iter()
        .map(|line| (line.merchandise_id.clone(), line.quantity))
        .collect();
    let mut plan = ReconcilePlan::default();

    for line in &remote.lines {
        match pending.remove(&line.merchandise_id) {
            Some(quantity) if quantity == line.quantity => {}
            Some(quantity) => plan.update.push(CartLineUpdateInput {
                id: line.id.clone(),
                quantity,
            }),
            None => plan.remove.push(line.id.clone()),
        }
    }

    plan.add = wanted
        .into_iter()
        .filter(|line| pending.contains_key(&line.merchandise_id))
        .collect();
    plan
}

/// Pushes the local cart to a [`CartBackend`].
pub struct CartSync<B> {
    store: CartStore,
    backend: B,
    mirror: Mutex<Option<RemoteCartMirror>>,
}

impl<B: CartBackend> CartSync<B> {
    /// Create a sync routine for `store` against `backend`.
    #[must_use]
    pub fn new(store: CartStore, backend: B) -> Self {
        Self {
            store,
            backend,
            mirror: Mutex::new(None),
        }
    }

    /// The local store being mirrored.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// The backend being pushed to.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The mirror recorded by the last successful sync.
    pub async fn mirror(&self) -> Option<RemoteCartMirror> {
        self.mirror.lock().await.clone()
    }

    /// Forget the mirror and its persisted ID.
    pub(crate) async fn reset_mirror(&self) {
        *self.mirror.lock().await = None;
        if let Err(e) = self.store.persistence().clear_remote_id() {
            warn!(error = %e, "Failed to clear remote cart ID");
        }
    }

    /// Push the local cart to the remote mirror.
    ///
    /// Never fails: errors are logged and returned as [`SyncOutcome::Failed`].
    #[instrument(skip(self))]
    pub async fn sync_with_remote(&self) -> SyncOutcome {
        self.sync_snapshot().await.0
    }

    /// Sync and return the local snapshot that was pushed.
    pub(crate) async fn sync_snapshot(&self) -> (SyncOutcome, Cart) {
        // Snapshot under the lock so overlapping syncs push the latest cart
        let mut mirror = self.mirror.lock().await;
        let cart = self.store.snapshot();
        if cart.is_empty() {
            return (SyncOutcome::SkippedEmpty, cart);
        }

        let (remote, outcome) = match self.push(&cart).await {
            Ok(pushed) => pushed,
            Err(e) => {
                warn!(error = %e, "Cart sync failed; local cart unchanged");
                return (SyncOutcome::Failed(e.to_string()), cart);
            }
        };

        if let Err(e) = self.store.persistence().save_remote_id(&remote.id) {
            warn!(error = %e, "Failed to persist remote cart ID");
        }
        *mirror = Some(RemoteCartMirror::from(remote));
        (outcome, cart)
    }

    async fn push(&self, cart: &Cart) -> Result<(ShopifyCart, SyncOutcome), ShopifyError> {
        if let Some(remote_id) = self.store.persistence().load_remote_id() {
            match self.backend.get_cart(&remote_id).await {
                Ok(remote) => match self.reconcile(cart, remote).await {
                    Ok(remote) => {
                        let outcome = SyncOutcome::Updated(remote.id.clone());
                        return Ok((remote, outcome));
                    }
                    Err(e) => {
                        warn!(error = %e, remote_id = %remote_id, "Updating remote cart failed, recreating");
                    }
                },
                Err(e) => {
                    info!(error = %e, remote_id = %remote_id, "Remote cart unavailable, recreating");
                }
            }
        }

        let remote = self.backend.create_cart(local_lines(cart)).await?;
        info!(remote_id = %remote.id, "Remote cart created");
        let outcome = SyncOutcome::Created(remote.id.clone());
        Ok((remote, outcome))
    }

    async fn reconcile(&self, cart: &Cart, remote: ShopifyCart) -> Result<ShopifyCart, ShopifyError> {
        let plan = plan_reconciliation(cart, &remote);
        let id = remote.id.clone();
        let mut current = remote;

        if !plan.remove.is_empty() {
            current = self.backend.remove_lines(&id, plan.remove).await?;
        }
        if !plan.update.is_empty() {
            current = self.backend.update_lines(&id, plan.update).await?;
        }
        if !plan.add.is_empty() {
            current = self.backend.add_lines(&id, plan.add).await?;
        }
        Ok(current)
    }
}

impl<B: CartBackend + 'static> CartSync<B> {
    /// Run a sync in the background so callers never wait on the network.
    #[must_use]
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<SyncOutcome> {
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.sync_with_remote().await })
    }

    /// Sync after every local cart change until the handle is aborted.
    ///
    /// Changes arriving while a sync is running are coalesced into the
    /// next sync.
    #[must_use]
    pub fn spawn_auto_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let sync = Arc::clone(self);
        let mut changes = self.store.subscribe();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let outcome = sync.sync_with_remote().await;
                debug!(?outcome, "Auto-sync finished");
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use storefront_cart_core::{LineItemId, PricingPolicy, ProductId, CartItem};

    use super::*;
    use crate::shopify::{Money, ShopifyCartCost, ShopifyCartLine};

    fn item(variant: &str, quantity: u32) -> CartItem {
        CartItem {
            id: LineItemId::new(format!("p-{variant}")),
            product_id: ProductId::new("p"),
            variant_id: VariantId::new(variant),
            title: "Tee".to_string(),
            unit_price: Decimal::new(1000, 2),
            quantity,
            image_url: None,
            selected_options: vec![],
        }
    }

    fn cart(items: Vec<CartItem>) -> Cart {
        let mut cart = Cart {
            items,
            ..Cart::default()
        };
        cart.recompute(&PricingPolicy::default());
        cart
    }

    fn money() -> Money {
        Money {
            amount: "0.0".to_string(),
            currency_code: "GBP".to_string(),
        }
    }

    fn remote(lines: &[(&str, &str, i64)]) -> ShopifyCart {
        ShopifyCart {
            id: RemoteCartId::new("c1"),
            checkout_url: "https://shop.example.com/checkout/c1".to_string(),
            total_quantity: lines.iter().map(|(_, _, q)| q).sum(),
            cost: ShopifyCartCost {
                subtotal: money(),
                total: money(),
            },
            lines: lines
                .iter()
                .map(|(id, variant, quantity)| ShopifyCartLine {
                    id: (*id).to_string(),
                    merchandise_id: VariantId::new(*variant),
                    merchandise_title: String::new(),
                    quantity: *quantity,
                    total_amount: money(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_plan_is_empty_when_in_sync() {
        let local = cart(vec![item("a", 1), item("b", 2)]);
        let plan = plan_reconciliation(&local, &remote(&[("l1", "a", 1), ("l2", "b", 2)]));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_updates_adds_and_removes() {
        let local = cart(vec![item("a", 3), item("c", 1)]);
        let plan = plan_reconciliation(&local, &remote(&[("l1", "a", 1), ("l2", "b", 2)]));

        assert_eq!(plan.remove, vec!["l2".to_string()]);
        assert_eq!(
            plan.update,
            vec![CartLineUpdateInput {
                id: "l1".to_string(),
                quantity: 3
            }]
        );
        assert_eq!(
            plan.add,
            vec![CartLineInput {
                merchandise_id: VariantId::new("c"),
                quantity: 1
            }]
        );
    }

    #[test]
    fn test_plan_removes_duplicate_remote_lines() {
        let local = cart(vec![item("a", 2)]);
        let plan = plan_reconciliation(&local, &remote(&[("l1", "a", 2), ("l2", "a", 1)]));
        assert_eq!(plan.remove, vec!["l2".to_string()]);
        assert!(plan.update.is_empty());
        assert!(plan.add.is_empty());
    }

    #[test]
    fn test_local_lines_preserve_order() {
        let lines = local_lines(&cart(vec![item("b", 1), item("a", 4)]));
        let ids: Vec<_> = lines.iter().map(|l| l.merchandise_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(lines.last().map(|l| l.quantity), Some(4));
    }

    #[test]
    fn test_outcome_remote_id() {
        let id = RemoteCartId::new("c1");
        assert_eq!(SyncOutcome::Created(id.clone()).remote_id(), Some(&id));
        assert_eq!(SyncOutcome::SkippedEmpty.remote_id(), None);
        assert_eq!(SyncOutcome::Failed("x".to_string()).remote_id(), None);
    }
}
