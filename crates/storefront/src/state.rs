//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, StoreClient};
use crate::cart::{CartRegistry, CheckoutSubmitter, FileStore, MemoryStore, StorageError};
use crate::config::StorefrontConfig;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("cart storage: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the checkout submitter and the per-session carts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: StoreClient,
    checkout: CheckoutSubmitter<StoreClient>,
    carts: CartRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Carts are file-backed under `config.cart_dir` when set, otherwise they
    /// live in memory and are dropped once idle long enough to be evicted.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the cart
    /// directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let carts = match &config.cart_dir {
            Some(dir) => {
                let store = FileStore::open(dir)?;
                tracing::info!(dir = %store.dir().display(), "Using file-backed carts");
                CartRegistry::new(Arc::new(store))
            }
            None => {
                tracing::info!("Using in-memory carts");
                CartRegistry::ephemeral(Arc::new(MemoryStore::new()))
            }
        };

        let client = StoreClient::new(&config.backend)?;
        Ok(Self::with_parts(config, client, carts))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn with_parts(config: StorefrontConfig, client: StoreClient, carts: CartRegistry) -> Self {
        let checkout = CheckoutSubmitter::new(Arc::new(client.clone()));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                checkout,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &StoreClient {
        &self.inner.client
    }

    /// Get a reference to the checkout submitter.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutSubmitter<StoreClient> {
        &self.inner.checkout
    }

    /// Get a reference to the per-session cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }
}
