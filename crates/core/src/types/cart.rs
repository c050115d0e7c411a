//! The local cart and its line items.
//!
//! A [`Cart`] is a plain value: an ordered list of [`CartItem`]s plus the
//! [`CartTotals`] derived from them. Every mutation recomputes the totals
//! from scratch, so the invariants below hold after any sequence of calls:
//!
//! - `item_count` equals the sum of line quantities
//! - `total` equals `subtotal + shipping`
//! - each `(product_id, variant_id)` pair appears on at most one line

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LineItemId, ProductId, VariantId};
use super::pricing::{CartTotals, PricingPolicy, round_money};
use super::product::{ProductSummary, SelectedOption};

/// Errors raised by invalid cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No variant could be resolved for the product.
    #[error("no purchasable variant found for product {product_id}")]
    MissingVariant {
        /// Product the caller tried to add.
        product_id: ProductId,
    },
    /// Quantity to add must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// One row in the cart: a product variant and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Composite of product, variant and creation time.
    pub id: LineItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub title: String,
    /// Tax-inclusive unit price.
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        &self.product_id == product_id && &self.variant_id == variant_id
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Line items in insertion order.
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn item(&self, id: &LineItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Compute totals for `items` under `policy`.
    #[must_use]
    pub fn compute_totals(items: &[CartItem], policy: &PricingPolicy) -> CartTotals {
        let subtotal = round_money(items.iter().map(CartItem::line_total).sum());
        let shipping = policy.shipping_for(subtotal, items.is_empty());
        let item_count = items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity));

        CartTotals {
            subtotal,
            tax: policy.tax_portion(subtotal),
            shipping,
            total: subtotal + shipping,
            item_count,
        }
    }

    /// Recompute the stored totals from the current items.
    pub fn recompute(&mut self, policy: &PricingPolicy) {
        self.totals = Self::compute_totals(&self.items, policy);
    }

    /// Add `quantity` of a product variant.
    ///
    /// Merges into the existing line for the same product and variant,
    /// otherwise appends a new line. Returns the ID of the affected line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::MissingVariant`] if no variant can be resolved.
    pub fn add_item(
        &mut self,
        product: &ProductSummary,
        quantity: u32,
        variant_id: Option<&VariantId>,
        policy: &PricingPolicy,
    ) -> Result<LineItemId, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let variant =
            product
                .resolve_variant(variant_id)
                .ok_or_else(|| CartError::MissingVariant {
                    product_id: product.id.clone(),
                })?;

        let id = if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.matches(&product.id, &variant.id))
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.id.clone()
        } else {
            let id = LineItemId::new(format!(
                "{}-{}-{}",
                product.id,
                variant.id,
                Utc::now().timestamp_millis()
            ));
            self.items.push(CartItem {
                id: id.clone(),
                product_id: product.id.clone(),
                variant_id: variant.id.clone(),
                title: product.line_title(variant),
                unit_price: variant.price,
                quantity,
                image_url: variant
                    .image_url
                    .clone()
                    .or_else(|| product.image_url.clone()),
                selected_options: variant.selected_options.clone(),
            });
            id
        };

        self.recompute(policy);
        Ok(id)
    }

    /// Remove a line. Returns `false` if no such line exists.
    pub fn remove_item(&mut self, id: &LineItemId, policy: &PricingPolicy) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        if self.items.len() == before {
            return false;
        }
        self.recompute(policy);
        true
    }

    /// Overwrite a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Returns `false` if the line does not exist or already has that quantity.
    pub fn set_quantity(&mut self, id: &LineItemId, quantity: i64, policy: &PricingPolicy) -> bool {
        if quantity <= 0 {
            return self.remove_item(id, policy);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(item) = self.items.iter_mut().find(|item| &item.id == id) else {
            return false;
        };
        if item.quantity == quantity {
            return false;
        }
        item.quantity = quantity;
        self.recompute(policy);
        true
    }

    /// Restore the line invariants on a cart read from outside.
    ///
    /// Drops zero-quantity lines, folds duplicate `(product_id, variant_id)`
    /// lines into the first one, then recomputes the totals.
    pub fn normalize(&mut self, policy: &PricingPolicy) {
        let mut items: Vec<CartItem> = Vec::with_capacity(self.items.len());
        for item in std::mem::take(&mut self.items) {
            if item.quantity == 0 {
                continue;
            }
            match items
                .iter_mut()
                .find(|kept| kept.matches(&item.product_id, &item.variant_id))
            {
                Some(kept) => kept.quantity = kept.quantity.saturating_add(item.quantity),
                None => items.push(item),
            }
        }
        self.items = items;
        self.recompute(policy);
    }

    /// Remove every line and zero the totals.
    pub fn clear(&mut self) {
        self.items.clear();
        self.totals = CartTotals::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::product::VariantSummary;

    fn product(id: &str, price: Decimal, variants: &[&str]) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            handle: id.to_string(),
            title: format!("Product {id}"),
            image_url: Some(format!("https://cdn.example.com/{id}.jpg")),
            variants: variants
                .iter()
                .map(|v| VariantSummary {
                    id: VariantId::new(*v),
                    title: "Default Title".to_string(),
                    price,
                    image_url: None,
                    selected_options: vec![],
                    available_for_sale: true,
                })
                .collect(),
        }
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_add_then_merge_crosses_free_shipping() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let p = product("p", dec(2000), &["v"]);

        let first = cart.add_item(&p, 1, None, &policy).unwrap();
        assert_eq!(cart.totals.subtotal, dec(2000));
        assert_eq!(cart.totals.shipping, dec(599));
        assert_eq!(cart.totals.total, dec(2599));

        let second = cart
            .add_item(&p, 2, Some(&VariantId::new("v")), &policy)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.totals.item_count, 3);
        assert_eq!(cart.totals.subtotal, dec(6000));
        assert_eq!(cart.totals.shipping, Decimal::ZERO);
        assert_eq!(cart.totals.total, dec(6000));
        assert_eq!(cart.totals.tax, dec(1000));
    }

    #[test]
    fn test_add_without_variant_fails() {
        let mut cart = Cart::new();
        let p = product("p", dec(1000), &[]);
        let err = cart
            .add_item(&p, 1, None, &PricingPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            CartError::MissingVariant {
                product_id: ProductId::new("p")
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_quantity_fails() {
        let mut cart = Cart::new();
        let p = product("p", dec(1000), &["v"]);
        assert_eq!(
            cart.add_item(&p, 0, None, &PricingPolicy::default()),
            Err(CartError::InvalidQuantity)
        );
    }

    #[test]
    fn test_different_variants_get_separate_lines() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let p = product("p", dec(1000), &["v1", "v2"]);
        cart.add_item(&p, 1, Some(&VariantId::new("v1")), &policy)
            .unwrap();
        cart.add_item(&p, 1, Some(&VariantId::new("v2")), &policy)
            .unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.totals.item_count, 2);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let policy = PricingPolicy::default();
        let p = product("p", dec(1000), &["v"]);

        let mut a = Cart::new();
        let id = a.add_item(&p, 2, None, &policy).unwrap();
        let mut b = a.clone();

        assert!(a.set_quantity(&id, 0, &policy));
        assert!(b.remove_item(&id, &policy));
        assert_eq!(a, b);
        assert_eq!(a.totals, CartTotals::default());
    }

    #[test]
    fn test_normalize_drops_empty_and_merges_duplicates() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let first = cart
            .add_item(&product("p", dec(1000), &["v"]), 1, None, &policy)
            .unwrap();
        cart.add_item(&product("q", dec(500), &["w"]), 1, None, &policy)
            .unwrap();

        let mut dup = cart.items[0].clone();
        dup.id = LineItemId::new("p-v-dup");
        dup.quantity = 2;
        let mut empty = cart.items[1].clone();
        empty.id = LineItemId::new("q-w-empty");
        cart.items[1].quantity = 0;
        empty.quantity = 0;
        cart.items.push(dup);
        cart.items.push(empty);

        cart.normalize(&policy);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, first);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.totals.item_count, 3);
        assert_eq!(cart.totals.subtotal, dec(3000));
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let id = cart
            .add_item(&product("p", dec(1000), &["v"]), 1, None, &policy)
            .unwrap();
        assert!(cart.set_quantity(&id, 6, &policy));
        assert_eq!(cart.item(&id).map(|i| i.quantity), Some(6));
        assert_eq!(cart.totals.subtotal, dec(6000));
        assert!(!cart.set_quantity(&id, 6, &policy));
    }

    #[test]
    fn test_unknown_line_is_noop() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let missing = LineItemId::new("missing");
        assert!(!cart.remove_item(&missing, &policy));
        assert!(!cart.set_quantity(&missing, 3, &policy));
    }

    #[test]
    fn test_clear_zeroes_everything() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        cart.add_item(&product("p", dec(1000), &["v"]), 4, None, &policy)
            .unwrap();
        cart.clear();
        assert!(cart.items.is_empty());
        assert_eq!(cart.totals, CartTotals::default());
    }

    #[test]
    fn test_json_round_trip() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        cart.add_item(&product("p", dec(1999), &["v"]), 2, None, &policy)
            .unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart, restored);
    }

    #[test]
    fn test_line_uses_product_image_when_variant_has_none() {
        let policy = PricingPolicy::default();
        let mut cart = Cart::new();
        let id = cart
            .add_item(&product("p", dec(1000), &["v"]), 1, None, &policy)
            .unwrap();
        let item = cart.item(&id).unwrap();
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://cdn.example.com/p.jpg")
        );
        assert_eq!(item.title, "Product p");
    }
}
