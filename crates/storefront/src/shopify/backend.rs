//! The remote cart contract the sync routine relies on.

use std::future::Future;

use storefront_cart_core::RemoteCartId;

use super::ShopifyError;
use super::types::{CartLineInput, CartLineUpdateInput, ShopifyCart};

/// Cart operations offered by a commerce backend.
///
/// Every call returns the full remote cart after the operation, mirroring
/// the Storefront API's mutation payloads.
pub trait CartBackend: Send + Sync {
    /// Create a cart holding `lines`.
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<ShopifyCart, ShopifyError>> + Send;

    /// Fetch a cart. Expired or unknown IDs yield [`ShopifyError::NotFound`].
    fn get_cart(
        &self,
        cart_id: &RemoteCartId,
    ) -> impl Future<Output = Result<ShopifyCart, ShopifyError>> + Send;

    /// Add lines to a cart.
    fn add_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<ShopifyCart, ShopifyError>> + Send;

    /// Change quantities of existing lines.
    fn update_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<ShopifyCart, ShopifyError>> + Send;

    /// Remove lines by line ID.
    fn remove_lines(
        &self,
        cart_id: &RemoteCartId,
        line_ids: Vec<String>,
    ) -> impl Future<Output = Result<ShopifyCart, ShopifyError>> + Send;
}
