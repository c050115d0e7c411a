//! Domain types for the Shopify cart mirror.
//!
//! These types provide a clean API separate from the raw GraphQL response
//! shapes in `storefront::conversions`.

use serde::{Deserialize, Serialize};
use storefront_cart_core::{RemoteCartId, VariantId};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// A line in the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyCartLine {
    /// Cart line ID.
    pub id: String,
    /// Product variant ID.
    pub merchandise_id: VariantId,
    /// Variant title.
    pub merchandise_title: String,
    /// Quantity.
    pub quantity: i64,
    /// Line total after discounts.
    pub total_amount: Money,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyCartCost {
    /// Subtotal before shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
}

/// A cart held by the Storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyCart {
    /// Cart ID.
    pub id: RemoteCartId,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Cart cost summary.
    pub cost: ShopifyCartCost,
    /// Cart lines.
    pub lines: Vec<ShopifyCartLine>,
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: VariantId,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: i64,
}

/// User error from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}
