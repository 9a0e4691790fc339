//! Checkout: turn a cart snapshot into a remote order.
//!
//! The order payload is built from a snapshot taken before the request is
//! sent. The cart is cleared only after the order service confirms; on any
//! failure it is left exactly as it was so the user can retry.
//!
//! Only one submission per cart may be pending. The submission itself runs
//! on a spawned task, so it completes (and is reconciled with the cart) even
//! if the caller stops waiting for it.

use std::future::Future;
use std::sync::Arc;

use fjord_core::{OrderConfirmation, OrderRequest};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};

use super::CartStore;
use crate::api::ApiError;

/// The order-creation collaborator.
pub trait OrderService: Send + Sync + 'static {
    /// Place an order. Exactly one call is made per checkout attempt.
    fn create_order(
        &self,
        request: &OrderRequest,
    ) -> impl Future<Output = Result<OrderConfirmation, ApiError>> + Send;
}

/// Checkout failures. All of them leave the cart untouched.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Another submission for this cart has not finished yet.
    #[error("a checkout is already in progress for this cart")]
    InFlight,

    /// The order service rejected the order or could not be reached.
    #[error("order creation failed: {0}")]
    Backend(#[source] ApiError),

    /// The order service answered but its reply could not be read. The order
    /// may have been placed; resubmitting could duplicate it.
    #[error("order status unknown: {0}")]
    Unconfirmed(String),

    /// The submission task panicked or was cancelled by runtime shutdown.
    #[error("checkout task failed: {0}")]
    Aborted(#[from] JoinError),
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unconfirmed(detail) => Self::Unconfirmed(detail),
            other => Self::Backend(other),
        }
    }
}

impl CheckoutError {
    /// Whether the user can simply try again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Aborted(_) | Self::InFlight)
    }
}

/// Submits carts to an [`OrderService`].
pub struct CheckoutSubmitter<O> {
    orders: Arc<O>,
}

impl<O> Clone for CheckoutSubmitter<O> {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
        }
    }
}

impl<O> std::fmt::Debug for CheckoutSubmitter<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSubmitter").finish_non_exhaustive()
    }
}

impl<O: OrderService> CheckoutSubmitter<O> {
    #[must_use]
    pub const fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }

    /// Submit `cart` as an order.
    ///
    /// On success the cart is cleared and the backend's confirmation returned.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InFlight`] if a submission for this cart is pending
    ///   (no request is sent)
    /// - [`CheckoutError::EmptyCart`] if there is nothing to order
    /// - [`CheckoutError::Backend`] if the order service fails; the cart is kept
    /// - [`CheckoutError::Unconfirmed`] if the order may have been placed but
    ///   was not confirmed; the cart is kept
    /// - [`CheckoutError::Aborted`] if the submission task did not complete
    #[instrument(skip_all, fields(cart = %cart.key()))]
    pub async fn submit(&self, cart: &CartStore) -> Result<OrderConfirmation, CheckoutError> {
        let guard = cart.try_begin_checkout().ok_or_else(|| {
            warn!("Rejected checkout: submission already in flight");
            CheckoutError::InFlight
        })?;

        let lines = cart.items();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let request = OrderRequest::from_lines(&lines);
        info!(
            line_count = request.items.len(),
            total = %request.total,
            "Submitting order"
        );

        let orders = Arc::clone(&self.orders);
        let cart = cart.clone();
        let submission = tokio::spawn(async move {
            let _guard = guard;
            let result = orders.create_order(&request).await;
            match &result {
                Ok(confirmation) => {
                    cart.clear();
                    info!(order_id = %confirmation.id, total = %confirmation.total, "Order placed, cart cleared");
                }
                Err(ApiError::Unconfirmed(detail)) => {
                    error!(%detail, "Order unconfirmed, cart preserved");
                }
                Err(e) => {
                    warn!(error = %e, "Order creation failed, cart preserved");
                }
            }
            result
        });

        Ok(submission.await??)
    }
}
