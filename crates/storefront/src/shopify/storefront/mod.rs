//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` envelopes with `reqwest` 0.13 for HTTP.
//! Caches product lookups using `moka` (5-minute TTL).

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use storefront_cart_core::{ProductSummary, RemoteCartId};
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::backend::CartBackend;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput, ShopifyCart};
use crate::shopify::{GraphQLError, ShopifyError};

use conversions::{
    AddToCartData, CartMutationPayload, CreateCartData, GetCartData, ProductData,
    RemoveFromCartData, UpdateCartLinesData, convert_cart, convert_product, convert_user_error,
};
use queries::{
    ADD_TO_CART, ADD_TO_CART_OPERATION, CREATE_CART, CREATE_CART_OPERATION, GET_CART,
    GET_CART_OPERATION, GET_PRODUCT_BY_HANDLE, GET_PRODUCT_BY_HANDLE_OPERATION, REMOVE_FROM_CART,
    REMOVE_FROM_CART_OPERATION, UPDATE_CART_LINES, UPDATE_CART_LINES_OPERATION,
};

/// Maximum variants fetched per product.
const VARIANT_COUNT: i64 = 50;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides product lookups and the cart operations used to maintain the
/// remote cart mirror. Products are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: Cache<String, ProductSummary>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(config.endpoint(), config.storefront_private_token.clone())
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: SecretString) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token,
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<V, D>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<D, ShopifyError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<D> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    /// Unwrap a cart mutation payload, surfacing user errors.
    fn mutation_cart(
        payload: Option<CartMutationPayload>,
        failure: &str,
    ) -> Result<ShopifyCart, ShopifyError> {
        if let Some(result) = payload {
            if !result.user_errors.is_empty() {
                return Err(ShopifyError::UserError(
                    result
                        .user_errors
                        .into_iter()
                        .map(|e| convert_user_error(e).message)
                        .collect::<Vec<_>>()
                        .join("; "),
                ));
            }

            if let Some(cart) = result.cart {
                return Ok(convert_cart(cart));
            }
        }

        Err(ShopifyError::message(failure))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<ProductSummary, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(product) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let data: ProductData = self
            .execute(
                GET_PRODUCT_BY_HANDLE_OPERATION,
                GET_PRODUCT_BY_HANDLE,
                json!({ "handle": handle, "variantCount": VARIANT_COUNT }),
            )
            .await?;

        let product_data = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        let product = convert_product(product_data)?;

        self.inner.cache.insert(cache_key, product.clone()).await;

        Ok(product)
    }

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&format!("product:{handle}"))
            .await;
    }
}

// =============================================================================
// Cart Methods (not cached - mutable state)
// =============================================================================

impl CartBackend for StorefrontClient {
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<ShopifyCart, ShopifyError> {
        let data: CreateCartData = self
            .execute(
                CREATE_CART_OPERATION,
                CREATE_CART,
                json!({ "input": { "lines": lines } }),
            )
            .await?;

        Self::mutation_cart(data.cart_create, "Failed to create cart")
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &RemoteCartId) -> Result<ShopifyCart, ShopifyError> {
        let data: GetCartData = self
            .execute(
                GET_CART_OPERATION,
                GET_CART,
                json!({ "cartId": cart_id }),
            )
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineInput>,
    ) -> Result<ShopifyCart, ShopifyError> {
        let data: AddToCartData = self
            .execute(
                ADD_TO_CART_OPERATION,
                ADD_TO_CART,
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;

        Self::mutation_cart(data.cart_lines_add, "Failed to add to cart")
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn update_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<ShopifyCart, ShopifyError> {
        let data: UpdateCartLinesData = self
            .execute(
                UPDATE_CART_LINES_OPERATION,
                UPDATE_CART_LINES,
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;

        Self::mutation_cart(data.cart_lines_update, "Failed to update cart")
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    async fn remove_lines(
        &self,
        cart_id: &RemoteCartId,
        line_ids: Vec<String>,
    ) -> Result<ShopifyCart, ShopifyError> {
        let data: RemoveFromCartData = self
            .execute(
                REMOVE_FROM_CART_OPERATION,
                REMOVE_FROM_CART,
                json!({ "cartId": cart_id, "lineIds": line_ids }),
            )
            .await?;

        Self::mutation_cart(data.cart_lines_remove, "Failed to remove from cart")
    }
}
