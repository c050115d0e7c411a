//! CLI command implementations.

pub mod cart;
pub mod remote;

use std::sync::Arc;

use storefront_cart::config::{CartConfig, ConfigError, ShopifyStorefrontConfig};
use storefront_cart::shopify::StorefrontClient;
use storefront_cart::storage::{FileStorage, StorageError};
use storefront_cart::{AppError, CartStore, CartSync};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The cart engine reported an error.
    #[error(transparent)]
    App(#[from] AppError),

    /// No line with this ID is in the cart.
    #[error("No cart line with ID: {0}")]
    UnknownLine(String),

    /// Shopify credentials are missing or invalid.
    #[error("Shopify is not configured: {0}")]
    ShopifyUnavailable(String),

    /// Writing to stdout failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        Self::App(e.into())
    }
}

/// The Shopify side of a command: the API client and the sync routine.
pub struct Remote {
    pub client: StorefrontClient,
    pub sync: Arc<CartSync<StorefrontClient>>,
}

/// Everything a command needs: the local store and, when credentials are
/// configured, the Shopify sync.
pub struct Context {
    pub store: CartStore,
    remote: Result<Remote, ConfigError>,
}

impl Context {
    /// Open the cart persisted under the configured storage directory.
    ///
    /// Missing Shopify credentials do not fail here; only commands that
    /// need Shopify report them.
    pub fn open(config: &CartConfig) -> Result<Self, CommandError> {
        let storage = FileStorage::open(&config.storage_dir)?;
        tracing::debug!(dir = %storage.dir().display(), "Opened cart storage");

        let store = CartStore::open(Arc::new(storage), config.pricing);
        let remote = ShopifyStorefrontConfig::from_env().map(|shopify| {
            let client = StorefrontClient::new(&shopify);
            let sync = Arc::new(CartSync::new(store.clone(), client.clone()));
            Remote { client, sync }
        });

        Ok(Self { store, remote })
    }

    /// The Shopify client and sync, or the configuration error that kept
    /// them from being built.
    pub fn remote(&self) -> Result<&Remote, CommandError> {
        self.remote
            .as_ref()
            .map_err(|e| CommandError::ShopifyUnavailable(e.to_string()))
    }
}
