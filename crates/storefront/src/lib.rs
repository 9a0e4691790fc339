//! Fjord Store storefront library.
//!
//! Cart store, cart persistence and checkout, the GraphQL backend client, and
//! the JSON HTTP API built on them. The `fjord-storefront` binary serves the
//! API; the `fjord` CLI drives the same cart and client directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
