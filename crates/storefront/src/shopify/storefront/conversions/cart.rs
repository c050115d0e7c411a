//! Cart type conversion functions.

use serde::Deserialize;
use storefront_cart_core::{RemoteCartId, VariantId};

use crate::shopify::types::{CartUserError, Money, ShopifyCart, ShopifyCartCost, ShopifyCartLine};

use super::{MoneyFields, Nodes};

// =============================================================================
// Response Shapes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostFields,
    pub lines: Nodes<CartLineFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCostFields,
    pub merchandise: MerchandiseFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseFields {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<CartUserErrorFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartData {
    pub cart_create: Option<CartMutationPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetCartData {
    pub cart: Option<CartFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartData {
    pub cart_lines_add: Option<CartMutationPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesData {
    pub cart_lines_update: Option<CartMutationPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartData {
    pub cart_lines_remove: Option<CartMutationPayload>,
}

// =============================================================================
// Conversions
// =============================================================================

fn convert_money(money: MoneyFields) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

pub fn convert_cart(cart: CartFields) -> ShopifyCart {
    ShopifyCart {
        id: RemoteCartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        cost: ShopifyCartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
        },
        lines: cart
            .lines
            .nodes
            .into_iter()
            .map(|line| ShopifyCartLine {
                id: line.id,
                merchandise_id: VariantId::new(line.merchandise.id),
                merchandise_title: line.merchandise.title,
                quantity: line.quantity,
                total_amount: convert_money(line.cost.total_amount),
            })
            .collect(),
    }
}

pub fn convert_user_error(error: CartUserErrorFields) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field,
        message: error.message,
    }
}
