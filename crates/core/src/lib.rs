//! Storefront Cart Core - Shared cart types.
//!
//! This crate provides the types used by every part of the storefront cart:
//! - `storefront-cart` - Cart store, persistence and backend sync
//! - `storefront-cart-cli` - Command-line cart shell
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, the cart model, product summaries and pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
