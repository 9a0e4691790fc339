//! Cart route handlers.
//!
//! Every handler works on the cart owned by the caller's session and answers
//! with the full cart, so clients never need a second round trip.

use axum::{
    Json,
    extract::{Query, State},
};
use fjord_core::{CartLineItem, CurrencyCode, ProductId, SelectedAttributes};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{CurrencyQuery, MoneyView};
use crate::cart::CartStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::SessionCart;
use crate::state::AppState;

/// One cart line for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub selected_attributes: SelectedAttributes,
    pub quantity: u32,
    pub unit_price: MoneyView,
    pub line_total: MoneyView,
    pub image: Option<String>,
}

impl CartLineView {
    fn new(line: CartLineItem, currency: CurrencyCode) -> Self {
        Self {
            unit_price: MoneyView::from_base(line.unit_price, currency),
            line_total: MoneyView::from_base(line.line_total(), currency),
            product_id: line.product_id,
            name: line.name,
            selected_attributes: line.selected_attributes,
            quantity: line.quantity,
            image: line.image_ref,
        }
    }
}

/// Cart display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: MoneyView,
    pub item_count: u64,
    pub checkout_in_progress: bool,
}

impl CartView {
    /// Snapshot `cart` for display in `currency`.
    #[must_use]
    pub fn new(cart: &CartStore, currency: CurrencyCode) -> Self {
        let lines = cart.items();
        Self {
            subtotal: MoneyView::from_base(fjord_core::subtotal(&lines), currency),
            item_count: fjord_core::total_quantity(&lines),
            lines: lines
                .into_iter()
                .map(|line| CartLineView::new(line, currency))
                .collect(),
            checkout_in_progress: cart.is_checkout_in_flight(),
        }
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub selected_attributes: SelectedAttributes,
    pub quantity: Option<u32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub selected_attributes: SelectedAttributes,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartBody {
    pub product_id: ProductId,
    #[serde(default)]
    pub selected_attributes: SelectedAttributes,
}

/// Display the cart.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<CartView>> {
    let currency = query.resolve(&state)?;
    Ok(Json(CartView::new(&cart, currency)))
}

/// Add a product variant to the cart.
///
/// The product is looked up in the catalog; it must be in stock and every
/// attribute group must have a valid selection.
#[instrument(skip(state, cart, body), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
    Query(query): Query<CurrencyQuery>,
    Json(body): Json<AddToCartBody>,
) -> Result<Json<CartView>> {
    let currency = query.resolve(&state)?;
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }

    let product = state.client().product(&body.product_id).await?;
    product.check_add_to_cart(&body.selected_attributes)?;

    cart.add_item(product.to_line_item(body.selected_attributes, quantity));
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", body.product_id.as_str())]),
    );
    info!(quantity, "Added to cart");

    Ok(Json(CartView::new(&cart, currency)))
}

/// Set a line's quantity. Quantities below 1 leave the line unchanged.
#[instrument(skip(state, cart, body), fields(product_id = %body.product_id, quantity = body.quantity))]
pub async fn update(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
    Query(query): Query<CurrencyQuery>,
    Json(body): Json<UpdateCartBody>,
) -> Result<Json<CartView>> {
    let currency = query.resolve(&state)?;
    cart.update_quantity(&body.product_id, &body.selected_attributes, body.quantity);
    Ok(Json(CartView::new(&cart, currency)))
}

/// Remove a line from the cart.
#[instrument(skip(state, cart, body), fields(product_id = %body.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
    Query(query): Query<CurrencyQuery>,
    Json(body): Json<RemoveFromCartBody>,
) -> Result<Json<CartView>> {
    let currency = query.resolve(&state)?;
    cart.remove_item(&body.product_id, &body.selected_attributes);
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", body.product_id.as_str())]),
    );
    Ok(Json(CartView::new(&cart, currency)))
}
