//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Errors render as `{"error": "<code>", "message": "<text>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fjord_core::AddToCartError;
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API operation failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Checkout could not be completed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Product/selection cannot be added to the cart.
    #[error("Cannot add to cart: {0}")]
    AddToCart(#[from] AddToCartError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_) | Self::Internal(_) => true,
            Self::Api(err) => !matches!(err, ApiError::NotFound(_)),
            Self::Checkout(err) => {
                matches!(
                    err,
                    CheckoutError::Backend(_) | CheckoutError::Unconfirmed(_) | CheckoutError::Aborted(_)
                )
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
                CheckoutError::InFlight => StatusCode::CONFLICT,
                CheckoutError::Backend(_) | CheckoutError::Unconfirmed(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::AddToCart(AddToCartError::OutOfStock(_)) => StatusCode::CONFLICT,
            Self::AddToCart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => "not_found",
            Self::Api(_) => "backend_error",
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "empty_cart",
                CheckoutError::InFlight => "checkout_in_progress",
                CheckoutError::Backend(_) => "order_failed",
                CheckoutError::Unconfirmed(_) => "order_unconfirmed",
                CheckoutError::Aborted(_) => "internal",
            },
            Self::AddToCart(AddToCartError::OutOfStock(_)) => "out_of_stock",
            Self::AddToCart(_) => "attributes_required",
            Self::BadRequest(_) => "bad_request",
            Self::Session(_) | Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) | Self::Checkout(CheckoutError::Aborted(_)) => {
                "Internal server error".to_string()
            }
            Self::Api(ApiError::NotFound(what)) => format!("Not found: {what}"),
            Self::Api(_) => "External service error".to_string(),
            Self::Checkout(CheckoutError::Backend(_)) => {
                "Order could not be placed, your cart was kept. Please try again.".to_string()
            }
            Self::Checkout(CheckoutError::Unconfirmed(_)) => {
                "Your order may have been placed. Check your orders before trying again.".to_string()
            }
            Self::Checkout(err) => err.to_string(),
            Self::AddToCart(err) => err.to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        };

        let body = ErrorBody {
            error: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "ps-5")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
