//! Integration tests for Fjord Store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fjord-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] serves the GraphQL
//! operations the storefront uses from an in-process axum server, and
//! [`spawn_storefront`] runs the real storefront router against it.
//!
//! # Test Categories
//!
//! - `client` - `StoreClient` against the mock backend
//! - `checkout` - cart + checkout flow, including failure and concurrency
//! - `storefront_api` - the JSON HTTP API through a cookie-holding client

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

pub mod mock_backend;

use std::net::SocketAddr;
use std::path::PathBuf;

use fjord_core::CurrencyCode;
use fjord_storefront::config::{BackendConfig, StorefrontConfig};
use fjord_storefront::routes;
use fjord_storefront::state::AppState;
use url::Url;

pub use mock_backend::MockBackend;

/// Bind an ephemeral port and serve `router` on it in the background.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Storefront configuration pointing at `backend`.
#[must_use]
pub fn storefront_config(backend: &Url, cart_dir: Option<PathBuf>) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        backend: BackendConfig::new(backend.clone()),
        cart_dir,
        default_currency: CurrencyCode::USD,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Run the storefront against `backend` and return its base URL.
pub async fn spawn_storefront(backend: &Url, cart_dir: Option<PathBuf>) -> String {
    let state = AppState::new(storefront_config(backend, cart_dir)).unwrap();
    let addr = serve(routes::app(state)).await;
    format!("http://{addr}")
}

/// An HTTP client that keeps the session cookie.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}
