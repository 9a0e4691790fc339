//! Checkout route handler.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use fjord_core::{OrderId, OrderLine};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::SessionCart;
use crate::state::AppState;

/// Confirmation returned after a successful order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedView {
    pub order_id: OrderId,
    /// Total charged, in the base currency.
    pub total: Decimal,
    pub items: Vec<OrderLine>,
    pub placed_at: DateTime<Utc>,
    pub message: &'static str,
}

/// Place an order from the session's cart.
///
/// The cart is cleared only when the backend confirms the order.
#[instrument(skip(state, cart))]
pub async fn place_order(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
) -> Result<Json<OrderPlacedView>> {
    let confirmation = state.checkout().submit(&cart).await?;
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", confirmation.id.as_str())]),
    );

    Ok(Json(OrderPlacedView {
        order_id: confirmation.id,
        total: confirmation.total,
        items: confirmation.items,
        placed_at: Utc::now(),
        message: "Order placed successfully!",
    }))
}
