//! Backend client implementation.
//!
//! Uses `graphql_client` for type-safe operations with `reqwest` 0.13 for HTTP.
//! Caches catalog reads using `moka` (5-minute TTL). Orders are never cached
//! or retried: one checkout attempt is one `createOrder` request.

use std::sync::Arc;
use std::time::Duration;

use fjord_core::{NewProduct, OrderConfirmation, OrderRequest, Product, ProductId};
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::conversions::{
    convert_created_product, convert_listed_product, convert_order, convert_order_input,
    convert_product, convert_product_input,
};
use super::queries::{
    CreateOrder, CreateProduct, DeleteProducts, GetProduct, GetProducts, create_order,
    create_product, delete_products, get_product, get_products,
};
use super::{ApiError, GraphQLError};
use crate::cart::OrderService;
use crate::config::BackendConfig;

// =============================================================================
// StoreClient
// =============================================================================

/// Client for the catalog/order GraphQL backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                endpoint: config.graphql_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ApiError>
    where
        Q::Variables: serde::Serialize,
    {
        let request_body = Q::build_query(variables);

        let mut request = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&request_body);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status(
                status.as_u16(),
                response_text.chars().take(200).collect(),
            ));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse GraphQL response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ApiError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "GraphQL response has no data and no errors"
            );
            ApiError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or a product carries an
    /// unusable price.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self.execute::<GetProducts>(get_products::Variables).await?;
        let products = Arc::new(
            data.products
                .into_iter()
                .map(convert_listed_product)
                .collect::<Result<Vec<_>, _>>()?,
        );
        debug!(count = products.len(), "Fetched products");

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the backend has no such product, or
    /// an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let variables = get_product::Variables {
            id: id.to_string(),
        };
        let data = self.execute::<GetProduct>(variables).await?;
        let product = data
            .product
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
            .and_then(convert_product)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order. Never retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or cannot be reached,
    /// or [`ApiError::Unconfirmed`] if it answered but the reply could not be
    /// read.
    #[instrument(skip(self, request), fields(line_count = request.items.len(), total = %request.total))]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, ApiError> {
        let variables = create_order::Variables {
            input: convert_order_input(request)?,
        };
        let data = match self.execute::<CreateOrder>(variables).await {
            Ok(data) => data,
            Err(ApiError::Parse(e)) => {
                error!(error = %e, "Order reply unreadable, order may have been placed");
                return Err(ApiError::Unconfirmed(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        let order_id = data.create_order.id.clone();
        convert_order(data.create_order).map_err(|e| {
            error!(%order_id, error = %e, "Order placed but confirmation unreadable");
            ApiError::Unconfirmed(format!("order {order_id}: {e}"))
        })
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================

    /// Create a catalog product. Invalidates cached listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let variables = create_product::Variables {
            input: convert_product_input(product)?,
        };
        let data = self.execute::<CreateProduct>(variables).await?;
        let created = convert_created_product(data.create_product)?;
        self.inner.cache.invalidate(&CacheKey::Products).await;
        Ok(created)
    }

    /// Delete products by id. Returns the backend's success flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn delete_products(&self, ids: &[ProductId]) -> Result<bool, ApiError> {
        let variables = delete_products::Variables {
            ids: ids.iter().map(ToString::to_string).collect(),
        };
        let data = self.execute::<DeleteProducts>(variables).await?;
        self.inner.cache.invalidate_all();
        Ok(data.delete_products)
    }
}

impl OrderService for StoreClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, ApiError> {
        Self::create_order(self, request).await
    }
}
