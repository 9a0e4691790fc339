//! Conversions between generated GraphQL types and domain types.
//!
//! `graphql_client` emits a separate struct tree per operation, so the product
//! conversion is stamped out once per operation that selects a product.

use std::str::FromStr;

use fjord_core::{
    AttributeItem, AttributeKind, AttributeSet, NewProduct, OrderConfirmation, OrderId, OrderLine,
    OrderRequest, Product, ProductId,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::ApiError;
use super::queries::{create_order, create_product, get_product, get_products};

/// Backend floats become exact decimals via their shortest decimal rendering,
/// so `19.99` stays `19.99`.
pub fn decimal_from_float(value: f64) -> Result<Decimal, ApiError> {
    if !value.is_finite() {
        return Err(ApiError::InvalidData(format!("non-finite amount {value}")));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|e| ApiError::InvalidData(format!("amount {value}: {e}")))
}

pub fn float_from_decimal(value: Decimal) -> Result<f64, ApiError> {
    value
        .to_f64()
        .ok_or_else(|| ApiError::InvalidData(format!("amount {value} is not representable")))
}

macro_rules! product_conversion {
    ($name:ident, $module:ident :: $product:ident, $attribute:ident, $item:ident) => {
        pub fn $name(data: $module::$product) -> Result<Product, ApiError> {
            let attributes = data
                .attributes
                .unwrap_or_default()
                .into_iter()
                .map(|set: $module::$attribute| AttributeSet {
                    id: set.id,
                    name: set.name,
                    kind: AttributeKind::from_backend(&set.type_),
                    items: set
                        .items
                        .into_iter()
                        .map(|item: $module::$item| AttributeItem {
                            id: item.id,
                            display_value: item.display_value,
                            value: item.value,
                        })
                        .collect(),
                })
                .collect();

            Ok(Product {
                id: ProductId::new(data.id),
                sku: data.sku,
                name: data.name,
                brand: data.brand,
                price: decimal_from_float(data.price)?,
                category: data.category,
                in_stock: data.in_stock,
                attributes,
                image: data.image_url.filter(|url| !url.is_empty()),
                gallery: data.gallery.unwrap_or_default(),
                description: data.description,
            })
        }
    };
}

product_conversion!(
    convert_listed_product,
    get_products::GetProductsProducts,
    GetProductsProductsAttributes,
    GetProductsProductsAttributesItems
);

product_conversion!(
    convert_product,
    get_product::GetProductProduct,
    GetProductProductAttributes,
    GetProductProductAttributesItems
);

product_conversion!(
    convert_created_product,
    create_product::CreateProductCreateProduct,
    CreateProductCreateProductAttributes,
    CreateProductCreateProductAttributesItems
);

/// Build the `createOrder` input. Quantities and the total are sent as-is.
pub fn convert_order_input(request: &OrderRequest) -> Result<create_order::OrderInput, ApiError> {
    Ok(create_order::OrderInput {
        items: request
            .items
            .iter()
            .map(|line| create_order::OrderItemInput {
                product_id: line.product_id.to_string(),
                quantity: i64::from(line.quantity),
            })
            .collect(),
        total: float_from_decimal(request.total)?,
    })
}

pub fn convert_order(data: create_order::CreateOrderCreateOrder) -> Result<OrderConfirmation, ApiError> {
    let items = data
        .items
        .into_iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                ApiError::InvalidData(format!(
                    "order line {} has quantity {}",
                    item.product_id, item.quantity
                ))
            })?;
            Ok(OrderLine {
                product_id: ProductId::new(item.product_id),
                quantity,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(OrderConfirmation {
        id: OrderId::new(data.id),
        total: decimal_from_float(data.total)?,
        items,
    })
}

pub fn convert_product_input(product: &NewProduct) -> Result<create_product::ProductInput, ApiError> {
    Ok(create_product::ProductInput {
        sku: product.sku.clone(),
        name: product.name.clone(),
        price: float_from_decimal(product.price)?,
        category: product.category.clone(),
        brand: product.brand.clone(),
        image_url: product.image.clone(),
        in_stock: product.in_stock,
        description: product.description.clone(),
    })
}
