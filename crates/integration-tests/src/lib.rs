//! Shared fixtures for the storefront cart integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-cart-integration-tests
//! ```
//!
//! No external services are needed: the Storefront API is replaced by
//! `wiremock` servers or the in-memory [`FakeBackend`].
//!
//! # Test Categories
//!
//! - `cart_properties` - totals invariants over random mutation sequences
//! - `storefront_client` - GraphQL client against a mock Storefront API
//! - `sync` - remote mirror creation, reconciliation and checkout
//! - `cross_handle` - cart changes observed across storage handles

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use storefront_cart::shopify::{
    CartBackend, CartLineInput, CartLineUpdateInput, GraphQLError, Money, ShopifyCart, ShopifyCartCost,
    ShopifyCartLine, ShopifyError, StorefrontClient,
};
use storefront_cart_core::{ProductId, ProductSummary, RemoteCartId, VariantId, VariantSummary};
use wiremock::MockServer;

// =============================================================================
// Catalog fixtures
// =============================================================================

/// Variant ID used for a fixture product's single variant.
#[must_use]
pub fn variant_id(handle: &str) -> VariantId {
    VariantId::new(format!("gid://shopify/ProductVariant/{handle}"))
}

/// A product with one default variant priced at `cents / 100`.
#[must_use]
pub fn product(handle: &str, cents: i64) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(format!("gid://shopify/Product/{handle}")),
        handle: handle.to_owned(),
        title: handle.replace('-', " "),
        image_url: None,
        variants: vec![VariantSummary {
            id: variant_id(handle),
            title: "Default Title".to_owned(),
            price: Decimal::new(cents, 2),
            image_url: None,
            selected_options: vec![],
            available_for_sale: true,
        }],
    }
}

// =============================================================================
// Storefront API response bodies
// =============================================================================

fn money_json(amount: &str) -> Value {
    json!({ "amount": amount, "currencyCode": "GBP" })
}

/// A `Cart` selection with `(line_id, variant_id, quantity)` lines.
#[must_use]
pub fn cart_json(id: &str, lines: &[(&str, &str, i64)]) -> Value {
    let nodes: Vec<Value> = lines
        .iter()
        .map(|(line_id, variant, quantity)| {
            json!({
                "id": line_id,
                "quantity": quantity,
                "cost": { "totalAmount": money_json("10.0") },
                "merchandise": { "id": variant, "title": "Default Title" }
            })
        })
        .collect();
    let total_quantity: i64 = lines.iter().map(|(_, _, q)| q).sum();

    json!({
        "id": id,
        "checkoutUrl": format!("https://shop.example.com/cart/c/{}", id.rsplit('/').next().unwrap_or(id)),
        "totalQuantity": total_quantity,
        "cost": {
            "subtotalAmount": money_json("10.0"),
            "totalAmount": money_json("10.0")
        },
        "lines": { "nodes": nodes }
    })
}

/// A GraphQL response wrapping a cart mutation payload under `field`.
#[must_use]
pub fn mutation_response(field: &str, cart: Value) -> Value {
    json!({ "data": { field: { "cart": cart, "userErrors": [] } } })
}

/// A `product` query response for a single-variant product.
#[must_use]
pub fn product_response(handle: &str, price: &str) -> Value {
    json!({
        "data": {
            "product": {
                "id": format!("gid://shopify/Product/{handle}"),
                "handle": handle,
                "title": "Pineapple Socks",
                "featuredImage": { "url": "https://cdn.example.com/socks.png" },
                "variants": { "nodes": [{
                    "id": variant_id(handle).as_str(),
                    "title": "Default Title",
                    "availableForSale": true,
                    "price": money_json(price),
                    "image": null,
                    "selectedOptions": [{ "name": "Title", "value": "Default Title" }]
                }]}
            }
        }
    })
}

/// A client pointed at a mock server's `/graphql` endpoint.
#[must_use]
pub fn client_for(server: &MockServer) -> StorefrontClient {
    StorefrontClient::with_endpoint(
        format!("{}/graphql", server.uri()),
        SecretString::from("shpat_test_token_9f8e7d6c5b4a"),
    )
}

// =============================================================================
// In-memory backend
// =============================================================================

/// In-memory [`CartBackend`] recording every call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    carts: HashMap<String, Vec<ShopifyCartLine>>,
    next_cart: u32,
    next_line: u32,
    offline: bool,
    delay: Duration,
    calls: Vec<&'static str>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Delay every call, as if the network were slow.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = delay;
    }

    async fn latency(&self) {
        let delay = self.state().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Forget a cart, as if it had expired.
    pub fn expire(&self, id: &RemoteCartId) {
        self.state().carts.remove(id.as_str());
    }

    /// Names of the operations called so far.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    /// `(variant, quantity)` lines of a remote cart.
    #[must_use]
    pub fn lines(&self, id: &RemoteCartId) -> Option<Vec<(String, i64)>> {
        self.state().carts.get(id.as_str()).map(|lines| {
            lines
                .iter()
                .map(|l| (l.merchandise_id.to_string(), l.quantity))
                .collect()
        })
    }

    fn call<F>(
        &self,
        op: &'static str,
        cart_id: Option<&RemoteCartId>,
        f: F,
    ) -> Result<ShopifyCart, ShopifyError>
    where
        F: FnOnce(&mut FakeState, &str) -> Result<(), ShopifyError>,
    {
        let mut state = self.state();
        state.calls.push(op);
        if state.offline {
            return Err(ShopifyError::GraphQL(vec![GraphQLError {
                message: "backend unreachable".to_owned(),
                locations: vec![],
                path: vec![],
            }]));
        }

        let id = match cart_id {
            Some(id) => id.to_string(),
            None => {
                state.next_cart += 1;
                let id = format!("gid://shopify/Cart/fake-{}", state.next_cart);
                state.carts.insert(id.clone(), Vec::new());
                id
            }
        };
        if !state.carts.contains_key(&id) {
            return Err(ShopifyError::NotFound(format!("Cart not found: {id}")));
        }
        f(&mut *state, &id)?;

        let lines = state.carts.get(&id).cloned().unwrap_or_default();
        Ok(ShopifyCart {
            checkout_url: format!("https://shop.example.com/cart/c/{}", id.rsplit('/').next().unwrap_or(&id)),
            id: RemoteCartId::new(id),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            cost: ShopifyCartCost {
                subtotal: zero(),
                total: zero(),
            },
            lines,
        })
    }
}

fn zero() -> Money {
    Money {
        amount: "0.0".to_owned(),
        currency_code: "GBP".to_owned(),
    }
}

fn push_lines(state: &mut FakeState, id: &str, lines: Vec<CartLineInput>) {
    for input in lines {
        state.next_line += 1;
        let line = ShopifyCartLine {
            id: format!("gid://shopify/CartLine/{}", state.next_line),
            merchandise_id: input.merchandise_id,
            merchandise_title: String::new(),
            quantity: input.quantity,
            total_amount: zero(),
        };
        if let Some(cart) = state.carts.get_mut(id) {
            cart.push(line);
        }
    }
}

impl CartBackend for FakeBackend {
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<ShopifyCart, ShopifyError> {
        self.latency().await;
        self.call("create_cart", None, |state, id| {
            push_lines(state, id, lines);
            Ok(())
        })
    }

    async fn get_cart(&self, cart_id: &RemoteCartId) -> Result<ShopifyCart, ShopifyError> {
        self.latency().await;
        self.call("get_cart", Some(cart_id), |_, _| Ok(()))
    }

    async fn add_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineInput>,
    ) -> Result<ShopifyCart, ShopifyError> {
        self.latency().await;
        self.call("add_lines", Some(cart_id), |state, id| {
            push_lines(state, id, lines);
            Ok(())
        })
    }

    async fn update_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<ShopifyCart, ShopifyError> {
        self.latency().await;
        self.call("update_lines", Some(cart_id), |state, id| {
            let cart = state.carts.entry(id.to_owned()).or_default();
            for update in lines {
                let line = cart
                    .iter_mut()
                    .find(|l| l.id == update.id)
                    .ok_or_else(|| ShopifyError::UserError(format!("Unknown line {}", update.id)))?;
                line.quantity = update.quantity;
            }
            Ok(())
        })
    }

    async fn remove_lines(
        &self,
        cart_id: &RemoteCartId,
        line_ids: Vec<String>,
    ) -> Result<ShopifyCart, ShopifyError> {
        self.latency().await;
        self.call("remove_lines", Some(cart_id), |state, id| {
            if let Some(cart) = state.carts.get_mut(id) {
                cart.retain(|l| !line_ids.contains(&l.id));
            }
            Ok(())
        })
    }
}
