//! GraphQL client for the catalog/order backend.
//!
//! # Architecture
//!
//! - Uses `graphql-client` for type-safe queries against `graphql/schema.graphql`
//! - The backend is the source of truth for products and orders
//! - Product listing and detail responses are cached with `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use fjord_storefront::api::StoreClient;
//!
//! let client = StoreClient::new(&config.backend)?;
//! let products = client.products().await?;
//! let order = client.create_order(&OrderRequest::from_lines(&cart.items())).await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod queries;

pub use client::StoreClient;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {0}: {1}")]
    Status(u16, String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The response parsed but carried values the storefront cannot use.
    #[error("Invalid data from backend: {0}")]
    InvalidData(String),

    /// The backend accepted a write but its reply could not be read, so the
    /// write may have taken effect.
    #[error("Unconfirmed backend write: {0}")]
    Unconfirmed(String),
}

/// A GraphQL error returned by the backend.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> GraphQLError {
        GraphQLError {
            message: text.to_string(),
            locations: vec![],
            path: vec![],
        }
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product ps-5".to_string());
        assert_eq!(err.to_string(), "Not found: product ps-5");

        let err = ApiError::Status(503, "maintenance".to_string());
        assert_eq!(err.to_string(), "Backend returned HTTP 503: maintenance");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ApiError::GraphQL(vec![message("Field not found"), message("Invalid ID")]);
        assert_eq!(err.to_string(), "GraphQL errors: Field not found; Invalid ID");
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 2, column: 3 }],
            path: vec![
                serde_json::Value::String("createOrder".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ApiError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: path: createOrder.0 at line 2:3");
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ApiError::GraphQL(vec![message("")]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = ApiError::GraphQL(vec![]);
        assert_eq!(err.to_string(), "GraphQL errors: (no error details provided)");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
