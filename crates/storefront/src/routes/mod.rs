//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//!
//! # Catalog
//! GET  /api/categories         - Navigation categories
//! GET  /api/products           - Product listing (?category=tech&currency=EUR)
//! GET  /api/products/{id}      - Product detail (?currency=EUR)
//!
//! # Cart (session-scoped)
//! GET  /api/cart               - Cart contents and totals (?currency=EUR)
//! POST /api/cart/add           - Add a product variant
//! POST /api/cart/update        - Set a line's quantity
//! POST /api/cart/remove        - Remove a line
//!
//! # Checkout
//! POST /api/checkout           - Place an order from the cart
//! ```
//!
//! All `/api` responses are JSON. Prices are converted from the base currency
//! into the requested display currency (default from config).

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use fjord_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::create_session_layer;
use crate::state::AppState;

/// A converted, display-ready amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyView {
    /// Rounded to 2 decimal places.
    pub amount: Decimal,
    pub currency: CurrencyCode,
    /// `€23.00`
    pub formatted: String,
}

impl MoneyView {
    /// Convert a base-currency amount for display.
    #[must_use]
    pub fn from_base(base_amount: Decimal, currency: CurrencyCode) -> Self {
        let price = Price::from_base(base_amount, currency);
        Self {
            amount: price.rounded(),
            currency,
            formatted: price.to_string(),
        }
    }
}

/// `?currency=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

impl CurrencyQuery {
    /// The requested currency, or the configured default.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an unsupported currency code.
    pub fn resolve(&self, state: &AppState) -> Result<CurrencyCode, AppError> {
        self.currency
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map_or(Ok(state.config().default_currency), |code| {
                code.parse()
                    .map_err(|e: fjord_core::CurrencyError| AppError::BadRequest(e.to_string()))
            })
    }
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/categories", get(products::categories))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::place_order))
}

/// The full application: routes, session layer and state.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    routes().layer(session_layer).with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
