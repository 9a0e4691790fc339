//! Session middleware and the per-session cart extractor.
//!
//! Sessions live in the in-process `tower-sessions` memory store. The only
//! thing kept in a session is the cart token; the cart itself lives in the
//! [`CartRegistry`](crate::cart::CartRegistry).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::debug;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fjord_session";

/// Session key holding the cart token.
pub const CART_TOKEN_KEY: &str = "cart_token";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor for the cart owned by the current session.
///
/// A session without a cart token gets a fresh one, so the first request
/// that touches the cart also sets the session cookie.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(SessionCart(cart): SessionCart) -> impl IntoResponse {
///     format!("{} items", cart.total_quantity())
/// }
/// ```
pub struct SessionCart(pub CartStore);

impl FromRequestParts<AppState> for SessionCart {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let token = match session.get::<Uuid>(CART_TOKEN_KEY).await? {
            Some(token) => token,
            None => {
                let token = Uuid::new_v4();
                session.insert(CART_TOKEN_KEY, token).await?;
                debug!(%token, "Issued cart token");
                token
            }
        };

        Ok(Self(state.carts().get(token).await))
    }
}
