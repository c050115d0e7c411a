//! Raw GraphQL response shapes and their conversion into domain types.

pub mod cart;
pub mod products;

use serde::Deserialize;

pub use cart::{
    AddToCartData, CartMutationPayload, CreateCartData, GetCartData,
    RemoveFromCartData, UpdateCartLinesData, convert_cart, convert_user_error,
};
pub use products::{ProductData, convert_product};

/// `{ nodes: [...] }` connection selection.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// `MoneyV2` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: String,
    pub currency_code: String,
}

/// `Image` selection.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageFields {
    pub url: String,
}
