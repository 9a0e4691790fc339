//! In-process stand-in for the catalog/order GraphQL backend.
//!
//! Dispatches on `operationName` rather than parsing queries. Orders can be
//! made to fail, or held until [`MockBackend::release_orders`] is called.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use url::Url;

/// How `createOrder` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    Succeed,
    /// HTTP 500 with a plain body.
    ServerError,
    /// HTTP 200 with a GraphQL `errors` array.
    GraphQLError,
    /// HTTP 200 with an order the storefront cannot read back.
    UnreadableReply,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLRequest {
    operation_name: Option<String>,
    #[serde(default)]
    variables: Value,
}

struct MockState {
    products: Mutex<Vec<Value>>,
    orders: Mutex<Vec<Value>>,
    order_outcome: Mutex<OrderOutcome>,
    hold_orders: AtomicBool,
    gate: Semaphore,
    order_calls: AtomicUsize,
    product_calls: AtomicUsize,
}

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<MockState>,
    url: Url,
}

impl MockBackend {
    /// Start a backend seeded with [`catalog`].
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            products: Mutex::new(catalog()),
            orders: Mutex::new(Vec::new()),
            order_outcome: Mutex::new(OrderOutcome::Succeed),
            hold_orders: AtomicBool::new(false),
            gate: Semaphore::new(0),
            order_calls: AtomicUsize::new(0),
            product_calls: AtomicUsize::new(0),
        });
        let router = Router::new()
            .route("/graphql.php", post(graphql))
            .with_state(Arc::clone(&state));
        let addr = crate::serve(router).await;
        let url = Url::parse(&format!("http://{addr}/graphql.php")).unwrap();
        Self { state, url }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_order_outcome(&self, outcome: OrderOutcome) {
        *self.state.order_outcome.lock().unwrap() = outcome;
    }

    /// Hold every `createOrder` until [`Self::release_orders`].
    pub fn hold_orders(&self) {
        self.state.hold_orders.store(true, Ordering::SeqCst);
    }

    /// Let held `createOrder` requests through.
    pub fn release_orders(&self) {
        self.state.hold_orders.store(false, Ordering::SeqCst);
        self.state.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// `createOrder` inputs received so far, in arrival order.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state.orders.lock().unwrap().clone()
    }

    #[must_use]
    pub fn order_calls(&self) -> usize {
        self.state.order_calls.load(Ordering::SeqCst)
    }

    /// Number of product queries served (listing and detail).
    #[must_use]
    pub fn product_calls(&self) -> usize {
        self.state.product_calls.load(Ordering::SeqCst)
    }

    /// Wait until `n` `createOrder` requests have arrived.
    pub async fn wait_for_orders(&self, n: usize) {
        while self.order_calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

async fn graphql(State(state): State<Arc<MockState>>, Json(request): Json<GraphQLRequest>) -> Response {
    let variables = request.variables;
    match request.operation_name.as_deref() {
        Some("GetProducts") => {
            state.product_calls.fetch_add(1, Ordering::SeqCst);
            let products = state.products.lock().unwrap().clone();
            data(json!({ "products": products }))
        }
        Some("GetProduct") => {
            state.product_calls.fetch_add(1, Ordering::SeqCst);
            let id = variables["id"].as_str().unwrap_or_default();
            let product = state
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p["id"] == id)
                .cloned()
                .unwrap_or(Value::Null);
            data(json!({ "product": product }))
        }
        Some("CreateOrder") => create_order(&state, &variables["input"]).await,
        Some("CreateProduct") => {
            let input = &variables["input"];
            let product = json!({
                "id": input["sku"],
                "sku": input["sku"],
                "name": input["name"],
                "price": input["price"],
                "category": input["category"],
                "brand": input["brand"],
                "image_url": input["image_url"],
                "in_stock": input["in_stock"],
                "description": input["description"],
                "gallery": [],
                "attributes": [],
            });
            state.products.lock().unwrap().push(product.clone());
            data(json!({ "createProduct": product }))
        }
        Some("DeleteProducts") => {
            let ids: Vec<String> = serde_json::from_value(variables["ids"].clone()).unwrap_or_default();
            state
                .products
                .lock()
                .unwrap()
                .retain(|p| !ids.iter().any(|id| p["id"] == id.as_str()));
            data(json!({ "deleteProducts": true }))
        }
        other => errors(&format!("unknown operation {other:?}")),
    }
}

async fn create_order(state: &MockState, input: &Value) -> Response {
    let call = state.order_calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.orders.lock().unwrap().push(input.clone());

    if state.hold_orders.load(Ordering::SeqCst) {
        let _permit = state.gate.acquire().await.unwrap();
    }

    let outcome = *state.order_outcome.lock().unwrap();
    match outcome {
        OrderOutcome::Succeed => data(json!({
            "createOrder": {
                "id": format!("{call}"),
                "total": input["total"],
                "items": input["items"],
            }
        })),
        OrderOutcome::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
        }
        OrderOutcome::GraphQLError => errors("Order total mismatch"),
        OrderOutcome::UnreadableReply => data(json!({
            "createOrder": {
                "id": format!("{call}"),
                "total": input["total"],
                "items": [{ "productId": "apple-airtag", "quantity": -1 }],
            }
        })),
    }
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn errors(message: &str) -> Response {
    Json(json!({
        "data": null,
        "errors": [{ "message": message, "locations": [{ "line": 2, "column": 3 }], "path": ["createOrder"] }]
    }))
    .into_response()
}

fn attribute(name: &str, kind: &str, values: &[(&str, &str)]) -> Value {
    json!({
        "id": name,
        "name": name,
        "type": kind,
        "items": values
            .iter()
            .map(|(display, value)| json!({ "id": display, "displayValue": display, "value": value }))
            .collect::<Vec<_>>(),
    })
}

/// The seeded catalog.
///
/// | id | category | price | stock | attributes |
/// |---|---|---|---|---|
/// | `apple-iphone-12-pro` | tech | 1000.76 | yes | Capacity, Color |
/// | `jacket-canada-goosee` | clothes | 518.47 | yes | Size |
/// | `apple-airtag` | electronics | 120.57 | yes | none |
/// | `xbox-series-s` | gadgets | 333.99 | no | Capacity |
/// | `wool-socks` | apparel | 10.00 | yes | none |
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "apple-iphone-12-pro",
            "sku": "IPH12P",
            "name": "iPhone 12 Pro",
            "price": 1000.76,
            "category": "tech",
            "brand": "Apple",
            "image_url": "https://img.example/iphone-12-pro.png",
            "in_stock": true,
            "description": "This is iPhone 12.",
            "gallery": ["https://img.example/iphone-12-pro.png"],
            "attributes": [
                attribute("Capacity", "text", &[("512G", "512G"), ("1T", "1T")]),
                attribute("Color", "swatch", &[("Green", "#44FF03"), ("White", "#FFFFFF")]),
            ],
        }),
        json!({
            "id": "jacket-canada-goosee",
            "sku": "JCG",
            "name": "Jacket",
            "price": 518.47,
            "category": "clothes",
            "brand": "Canada Goose",
            "image_url": null,
            "in_stock": true,
            "description": null,
            "gallery": ["https://img.example/jacket-1.png", "https://img.example/jacket-2.png"],
            "attributes": [attribute("Size", "text", &[("Small", "S"), ("Medium", "M"), ("Large", "L")])],
        }),
        json!({
            "id": "apple-airtag",
            "sku": "AIRTAG",
            "name": "AirTag",
            "price": 120.57,
            "category": "electronics",
            "brand": "Apple",
            "image_url": "https://img.example/airtag.png",
            "in_stock": true,
            "description": null,
            "gallery": null,
            "attributes": [],
        }),
        json!({
            "id": "xbox-series-s",
            "sku": "XBOXS",
            "name": "Xbox Series S 512GB",
            "price": 333.99,
            "category": "gadgets",
            "brand": "Microsoft",
            "image_url": null,
            "in_stock": false,
            "description": null,
            "gallery": [],
            "attributes": [attribute("Capacity", "text", &[("512G", "512G")])],
        }),
        json!({
            "id": "wool-socks",
            "sku": "SOCKS",
            "name": "Wool Socks",
            "price": 10.0,
            "category": "apparel",
            "brand": null,
            "image_url": null,
            "in_stock": true,
            "description": null,
            "gallery": null,
            "attributes": null,
        }),
    ]
}
