//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod products;

use std::path::Path;
use std::sync::Arc;

use fjord_core::{AddToCartError, CurrencyCode, Product};
use fjord_storefront::api::{ApiError, StoreClient};
use fjord_storefront::cart::{
    CART_KEY, CartStore, CheckoutError, FileStore, KeyValueStore, StorageError,
};
use fjord_storefront::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Storage slot for locally drafted products.
const DRAFTS_KEY: &str = "drafts";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cannot add to cart: {0}")]
    AddToCart(#[from] AddToCartError),

    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Invalid draft data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend refused to delete products")]
    DeleteRefused,
}

/// Everything a command needs: backend client, local storage and display currency.
pub struct Context {
    storage: Arc<FileStore>,
    backend: BackendConfig,
    pub currency: CurrencyCode,
}

impl Context {
    /// Open the cart directory and load backend settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the backend
    /// configuration is invalid.
    pub fn new(cart_dir: &Path, currency: CurrencyCode) -> Result<Self, CliError> {
        Ok(Self {
            storage: Arc::new(FileStore::open(cart_dir)?),
            backend: BackendConfig::from_env()?,
            currency,
        })
    }

    /// A client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self) -> Result<StoreClient, CliError> {
        Ok(StoreClient::new(&self.backend)?)
    }

    /// The local cart.
    #[must_use]
    pub fn cart(&self) -> CartStore {
        CartStore::open(self.storage.clone(), CART_KEY)
    }

    /// Products drafted locally. Missing data is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the drafts file cannot be read or parsed.
    pub fn drafts(&self) -> Result<Vec<Product>, CliError> {
        match self.storage.get(DRAFTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append `product` to the drafts, replacing any draft with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the drafts cannot be read or written.
    pub fn save_draft(&self, product: Product) -> Result<(), CliError> {
        let mut drafts = self.drafts()?;
        drafts.retain(|p| p.id != product.id);
        drafts.push(product);
        self.storage.set(DRAFTS_KEY, &serde_json::to_string(&drafts)?)?;
        Ok(())
    }
}
