//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use fjord_core::{AttributeGroup, Category, CurrencyCode, Product, ProductId, filter_products};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{CurrencyQuery, MoneyView};
use crate::error::Result;
use crate::state::AppState;

/// Product card data for listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub category: String,
    pub in_stock: bool,
    pub price: MoneyView,
    pub image: Option<String>,
    /// Whether the listing may add this product without a detail view.
    pub quick_add: bool,
}

impl ProductView {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            in_stock: product.in_stock,
            price: MoneyView::from_base(product.price, currency),
            image: product
                .image
                .clone()
                .or_else(|| product.gallery.first().cloned()),
            quick_add: product.quick_add_allowed(),
        }
    }
}

/// Product detail data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailView {
    #[serde(flatten)]
    pub summary: ProductView,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub gallery: Vec<String>,
    /// One entry per attribute name; a value must be chosen for each before adding.
    pub attributes: Vec<AttributeGroup>,
}

/// Navigation entry.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub name: Category,
    pub slug: String,
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub currency: Option<String>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub struct ListingView {
    pub category: Category,
    pub currency: CurrencyCode,
    pub products: Vec<ProductView>,
}

/// Navigation categories, `All` first.
pub async fn categories() -> Json<Vec<CategoryView>> {
    Json(
        Category::navigation()
            .into_iter()
            .map(|category| CategoryView {
                slug: category.slug(),
                name: category,
            })
            .collect(),
    )
}

/// Product listing, optionally filtered by category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingView>> {
    let currency = CurrencyQuery {
        currency: query.currency,
    }
    .resolve(&state)?;
    let category = Category::from_slug(query.category.as_deref().unwrap_or_default());

    let products = state.client().products().await?;
    let products = filter_products(&products, &category)
        .into_iter()
        .map(|product| ProductView::new(product, currency))
        .collect();

    Ok(Json(ListingView {
        category,
        currency,
        products,
    }))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<ProductDetailView>> {
    let currency = query.resolve(&state)?;
    let product = state.client().product(&ProductId::new(id)).await?;

    Ok(Json(ProductDetailView {
        summary: ProductView::new(&product, currency),
        sku: product.sku.clone(),
        description: product.description.clone(),
        gallery: product.gallery.clone(),
        attributes: product.attribute_groups(),
    }))
}
