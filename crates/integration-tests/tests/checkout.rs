//! Integration tests for cart persistence and checkout against the mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use fjord_core::{ProductId, SelectedAttributes};
use fjord_integration_tests::MockBackend;
use fjord_integration_tests::mock_backend::OrderOutcome;
use fjord_storefront::api::{ApiError, StoreClient};
use fjord_storefront::cart::{CART_KEY, CartStore, CheckoutError, CheckoutSubmitter, FileStore};
use fjord_storefront::config::BackendConfig;
use rust_decimal::Decimal;
use serde_json::json;

struct Shop {
    backend: MockBackend,
    client: StoreClient,
    submitter: CheckoutSubmitter<StoreClient>,
}

async fn shop() -> Shop {
    let backend = MockBackend::start().await;
    let client = StoreClient::new(&BackendConfig::new(backend.url().clone())).unwrap();
    let submitter = CheckoutSubmitter::new(Arc::new(client.clone()));
    Shop {
        backend,
        client,
        submitter,
    }
}

async fn add(shop: &Shop, cart: &CartStore, id: &str, selections: SelectedAttributes, quantity: u32) {
    let product = shop.client.product(&ProductId::new(id)).await.unwrap();
    product.check_add_to_cart(&selections).unwrap();
    cart.add_item(product.to_line_item(selections, quantity));
}

fn iphone_green() -> SelectedAttributes {
    SelectedAttributes::from([("Capacity", "512G"), ("Color", "#44FF03")])
}

// =============================================================================
// Submission Tests
// =============================================================================

#[tokio::test]
async fn test_checkout_sends_snapshot_and_clears_cart() {
    let shop = shop().await;
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-iphone-12-pro", iphone_green(), 2).await;
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 1).await;

    let confirmation = shop.submitter.submit(&cart).await.unwrap();

    assert_eq!(confirmation.id.as_str(), "1");
    assert_eq!(confirmation.total, Decimal::new(212_209, 2));
    assert_eq!(confirmation.items.len(), 2);
    assert!(cart.is_empty());
    assert!(!cart.is_checkout_in_flight());

    let orders = shop.backend.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(
        orders[0],
        json!({
            "items": [
                { "productId": "apple-iphone-12-pro", "quantity": 2 },
                { "productId": "apple-airtag", "quantity": 1 },
            ],
            "total": 2122.09,
        })
    );
}

#[tokio::test]
async fn test_same_product_different_variants_are_separate_order_lines() {
    let shop = shop().await;
    let cart = CartStore::in_memory();
    add(&shop, &cart, "jacket-canada-goosee", SelectedAttributes::from([("Size", "S")]), 1).await;
    add(&shop, &cart, "jacket-canada-goosee", SelectedAttributes::from([("Size", "L")]), 1).await;
    add(&shop, &cart, "jacket-canada-goosee", SelectedAttributes::from([("Size", "S")]), 1).await;
    assert_eq!(cart.len(), 2);

    shop.submitter.submit(&cart).await.unwrap();

    let orders = shop.backend.orders();
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
    assert_eq!(orders[0]["items"][1]["quantity"], 1);
}

#[tokio::test]
async fn test_backend_error_keeps_cart() {
    let shop = shop().await;
    shop.backend.set_order_outcome(OrderOutcome::ServerError);
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 3).await;

    let err = shop.submitter.submit(&cart).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Backend(ApiError::Status(500, _))));
    assert!(err.is_retryable());
    assert_eq!(cart.total_quantity(), 3);
    assert!(!cart.is_checkout_in_flight());

    shop.backend.set_order_outcome(OrderOutcome::Succeed);
    shop.submitter.submit(&cart).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(shop.backend.order_calls(), 2);
}

#[tokio::test]
async fn test_graphql_error_keeps_cart() {
    let shop = shop().await;
    shop.backend.set_order_outcome(OrderOutcome::GraphQLError);
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 1).await;

    let err = shop.submitter.submit(&cart).await.unwrap_err();
    let CheckoutError::Backend(ApiError::GraphQL(errors)) = &err else {
        panic!("expected GraphQL error, got {err:?}");
    };
    assert_eq!(errors[0].message, "Order total mismatch");
    assert_eq!(cart.len(), 1);
}

#[tokio::test]
async fn test_unreadable_order_reply_is_unconfirmed_and_keeps_cart() {
    let shop = shop().await;
    shop.backend.set_order_outcome(OrderOutcome::UnreadableReply);
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 2).await;

    let err = shop.submitter.submit(&cart).await.unwrap_err();
    let CheckoutError::Unconfirmed(detail) = &err else {
        panic!("expected unconfirmed order, got {err:?}");
    };
    assert!(detail.contains("order 1"));
    assert!(!err.is_retryable());
    assert_eq!(cart.total_quantity(), 2);
    assert!(!cart.is_checkout_in_flight());
    assert_eq!(shop.backend.order_calls(), 1);
}

#[tokio::test]
async fn test_empty_cart_sends_nothing() {
    let shop = shop().await;
    let err = shop.submitter.submit(&CartStore::in_memory()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(shop.backend.order_calls(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test]
async fn test_second_submission_rejected_while_first_pending() {
    let shop = shop().await;
    shop.backend.hold_orders();
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 1).await;

    let first = {
        let submitter = shop.submitter.clone();
        let cart = cart.clone();
        tokio::spawn(async move { submitter.submit(&cart).await })
    };
    shop.backend.wait_for_orders(1).await;
    assert!(cart.is_checkout_in_flight());

    let err = shop.submitter.submit(&cart).await.unwrap_err();
    assert!(matches!(err, CheckoutError::InFlight));

    shop.backend.release_orders();
    first.await.unwrap().unwrap();
    assert!(cart.is_empty());
    assert_eq!(shop.backend.order_calls(), 1);
}

#[tokio::test]
async fn test_items_added_during_checkout_are_cleared_with_it() {
    let shop = shop().await;
    shop.backend.hold_orders();
    let cart = CartStore::in_memory();
    add(&shop, &cart, "apple-airtag", SelectedAttributes::new(), 1).await;

    let pending = {
        let submitter = shop.submitter.clone();
        let cart = cart.clone();
        tokio::spawn(async move { submitter.submit(&cart).await })
    };
    shop.backend.wait_for_orders(1).await;
    add(&shop, &cart, "wool-socks", SelectedAttributes::new(), 1).await;

    shop.backend.release_orders();
    let confirmation = pending.await.unwrap().unwrap();

    assert_eq!(confirmation.items.len(), 1);
    assert!(cart.is_empty());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_file_backed_cart_survives_reopen_and_checkout_clears_it() {
    let shop = shop().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());

    let cart = CartStore::open(store.clone(), CART_KEY);
    add(&shop, &cart, "jacket-canada-goosee", SelectedAttributes::from([("Size", "M")]), 2).await;
    drop(cart);

    let reopened = CartStore::open(store.clone(), CART_KEY);
    assert_eq!(reopened.total_quantity(), 2);
    assert_eq!(reopened.subtotal(), Decimal::new(103_694, 2));

    shop.submitter.submit(&reopened).await.unwrap();
    assert!(CartStore::open(store, CART_KEY).is_empty());
}
