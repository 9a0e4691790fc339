//! Fjord Core - Shared types library.
//!
//! This crate provides the domain types used across all Fjord Store components:
//! - `storefront` - Cart store, checkout, backend client and JSON API
//! - `cli` - Command-line storefront operating on a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices and currencies, cart lines, catalog products,
//!   categories and order payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
