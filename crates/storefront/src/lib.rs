//! Storefront cart engine.
//!
//! A local, persisted shopping cart that mirrors itself to a Shopify cart
//! and hands off to Shopify's hosted checkout.
//!
//! - [`store::CartStore`] holds the authoritative cart and notifies
//!   subscribers on every change.
//! - [`persistence::CartPersistence`] reads and writes it through a
//!   [`storage::KeyValueStorage`].
//! - [`sync::CartSync`] pushes it to a [`shopify::CartBackend`] and
//!   [`sync::CartSync::checkout`] returns the checkout URL.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, allow(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod persistence;
pub mod shopify;
pub mod storage;
pub mod store;
pub mod sync;

pub use checkout::CheckoutError;
pub use error::{AppError, Result};
pub use store::CartStore;
pub use sync::{CartSync, RemoteCartMirror, SyncOutcome};
