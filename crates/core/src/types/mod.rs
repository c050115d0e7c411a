//! Core types for the storefront cart.
//!
//! This module provides the cart value, its line items, and the pricing
//! rules used to derive totals.

pub mod cart;
pub mod id;
pub mod pricing;
pub mod product;

pub use cart::{Cart, CartError, CartItem};
pub use id::*;
pub use pricing::{CartTotals, PricingPolicy, round_money};
pub use product::{DEFAULT_VARIANT_TITLE, ProductSummary, SelectedOption, VariantSummary};
