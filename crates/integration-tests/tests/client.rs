//! Integration tests for `StoreClient` against the mock GraphQL backend.

#![allow(clippy::unwrap_used)]

use fjord_core::{AttributeKind, NewProduct, ProductId};
use fjord_integration_tests::MockBackend;
use fjord_storefront::api::{ApiError, StoreClient};
use fjord_storefront::config::BackendConfig;
use rust_decimal::Decimal;

fn client(backend: &MockBackend) -> StoreClient {
    StoreClient::new(&BackendConfig::new(backend.url().clone())).unwrap()
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_products_converts_backend_fields() {
    let backend = MockBackend::start().await;
    let products = client(&backend).products().await.unwrap();

    assert_eq!(products.len(), 5);
    let iphone = &products[0];
    assert_eq!(iphone.id, ProductId::new("apple-iphone-12-pro"));
    assert_eq!(iphone.price, Decimal::new(100_076, 2));
    assert_eq!(iphone.brand.as_deref(), Some("Apple"));
    assert_eq!(iphone.attributes.len(), 2);
    assert_eq!(iphone.attributes[1].kind, AttributeKind::Swatch);

    let socks = products.iter().find(|p| p.id.as_str() == "wool-socks").unwrap();
    assert!(socks.attributes.is_empty());
    assert!(socks.gallery.is_empty());
    assert!(socks.quick_add_allowed());
}

#[tokio::test]
async fn test_products_are_cached() {
    let backend = MockBackend::start().await;
    let client = client(&backend);

    client.products().await.unwrap();
    client.products().await.unwrap();
    assert_eq!(backend.product_calls(), 1);

    client.product(&ProductId::new("apple-airtag")).await.unwrap();
    client.product(&ProductId::new("apple-airtag")).await.unwrap();
    assert_eq!(backend.product_calls(), 2);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let backend = MockBackend::start().await;
    let err = client(&backend)
        .product(&ProductId::new("no-such-thing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_product_detail_groups_attributes() {
    let backend = MockBackend::start().await;
    let jacket = client(&backend)
        .product(&ProductId::new("jacket-canada-goosee"))
        .await
        .unwrap();

    let groups = jacket.attribute_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Size");
    assert_eq!(groups[0].values, vec!["S", "M", "L"]);
    assert_eq!(jacket.image, None);
    assert_eq!(jacket.gallery.len(), 2);
}

// =============================================================================
// Admin Tests
// =============================================================================

#[tokio::test]
async fn test_create_product_invalidates_listing() {
    let backend = MockBackend::start().await;
    let client = client(&backend);
    assert_eq!(client.products().await.unwrap().len(), 5);

    let created = client
        .create_product(&NewProduct {
            sku: "HAT-01".to_string(),
            name: "Beanie".to_string(),
            price: Decimal::new(1999, 2),
            category: "clothes".to_string(),
            brand: None,
            image: None,
            description: Some("Warm.".to_string()),
            in_stock: true,
        })
        .await
        .unwrap();
    assert_eq!(created.id, ProductId::new("HAT-01"));
    assert_eq!(created.price, Decimal::new(1999, 2));

    let products = client.products().await.unwrap();
    assert_eq!(products.len(), 6);
    assert_eq!(backend.product_calls(), 2);
}

#[tokio::test]
async fn test_delete_products_clears_cache() {
    let backend = MockBackend::start().await;
    let client = client(&backend);
    let airtag = ProductId::new("apple-airtag");
    client.product(&airtag).await.unwrap();

    assert!(client.delete_products(&[airtag.clone()]).await.unwrap());

    let err = client.product(&airtag).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(client.products().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let url = url::Url::parse("http://127.0.0.1:9/graphql.php").unwrap();
    let client = StoreClient::new(&BackendConfig::new(url)).unwrap();
    let err = client.products().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
}
