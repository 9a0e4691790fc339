//! Order payloads exchanged with the order-creation service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartLineItem, subtotal};
use super::id::{OrderId, ProductId};
use super::price::round_money;

/// One ordered product and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order submission payload: `{ items: [{productId, quantity}], total }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    /// Cart subtotal at snapshot time, rounded to 2 decimal places.
    pub total: Decimal,
}

impl OrderRequest {
    /// Snapshot cart lines into an order payload.
    #[must_use]
    pub fn from_lines(lines: &[CartLineItem]) -> Self {
        Self {
            items: lines
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            total: round_money(subtotal(lines)),
        }
    }
}

/// Order record returned by the backend on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub id: OrderId,
    pub total: Decimal,
    pub items: Vec<OrderLine>,
}
