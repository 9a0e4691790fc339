//! Catalog products as consumed by the storefront.
//!
//! Products come from the backend's catalog query. The cart only needs a
//! projection of them (`id`, `name`, `price`, image, chosen attributes), built
//! by [`Product::to_line_item`] once [`Product::check_add_to_cart`] passes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::attributes::SelectedAttributes;
use super::cart::CartLineItem;
use super::id::ProductId;

/// How an attribute is presented for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    #[default]
    Text,
    /// Values are colors (`#44FF03`).
    Swatch,
}

impl AttributeKind {
    /// Parse the backend's free-form type name. `color` is treated as a swatch.
    #[must_use]
    pub fn from_backend(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "swatch" | "color" => Self::Swatch,
            _ => Self::Text,
        }
    }
}

/// One selectable value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeItem {
    pub id: String,
    pub display_value: String,
    pub value: String,
}

/// A named attribute with its selectable values, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSet {
    pub id: String,
    pub name: String,
    pub kind: AttributeKind,
    pub items: Vec<AttributeItem>,
}

/// An attribute name with the distinct values offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeGroup {
    pub name: String,
    pub kind: AttributeKind,
    pub values: Vec<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    /// Price in the base currency.
    pub price: Decimal,
    pub category: String,
    pub in_stock: bool,
    pub attributes: Vec<AttributeSet>,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub description: Option<String>,
}

/// Reasons a product/selection cannot become a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddToCartError {
    #[error("{0} is out of stock")]
    OutOfStock(ProductId),

    #[error("select a value for {0}")]
    MissingAttribute(String),

    #[error("{name} has no option {value}")]
    UnknownValue { name: String, value: String },

    #[error("{0} is not an attribute of this product")]
    UnknownAttribute(String),
}

impl Product {
    /// Distinct attribute names in first-seen order, each with its distinct values.
    #[must_use]
    pub fn attribute_groups(&self) -> Vec<AttributeGroup> {
        let mut groups: Vec<AttributeGroup> = Vec::new();
        for set in &self.attributes {
            let index = match groups.iter().position(|g| g.name == set.name) {
                Some(index) => index,
                None => {
                    groups.push(AttributeGroup {
                        name: set.name.clone(),
                        kind: set.kind,
                        values: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            if let Some(group) = groups.get_mut(index) {
                for item in &set.items {
                    if !group.values.contains(&item.value) {
                        group.values.push(item.value.clone());
                    }
                }
            }
        }
        groups
    }

    /// Whether the product can be added straight from a listing, without
    /// choosing any attributes.
    #[must_use]
    pub fn quick_add_allowed(&self) -> bool {
        self.in_stock && self.attributes.is_empty()
    }

    /// Check that `selections` picks exactly one offered value for every
    /// attribute group of an in-stock product.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: out of stock, an unselected group, a
    /// value the group does not offer, or a selection for an unknown attribute.
    pub fn check_add_to_cart(&self, selections: &SelectedAttributes) -> Result<(), AddToCartError> {
        if !self.in_stock {
            return Err(AddToCartError::OutOfStock(self.id.clone()));
        }

        let groups = self.attribute_groups();
        for group in &groups {
            let value = selections
                .get(&group.name)
                .ok_or_else(|| AddToCartError::MissingAttribute(group.name.clone()))?;
            if !group.values.iter().any(|v| v == value) {
                return Err(AddToCartError::UnknownValue {
                    name: group.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        if let Some((name, _)) = selections
            .iter()
            .find(|(name, _)| !groups.iter().any(|g| g.name == *name))
        {
            return Err(AddToCartError::UnknownAttribute(name.to_string()));
        }

        Ok(())
    }

    /// Project this product into a cart line. Does not validate; call
    /// [`Product::check_add_to_cart`] first.
    #[must_use]
    pub fn to_line_item(&self, selections: SelectedAttributes, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            selected_attributes: selections,
            quantity,
            image_ref: self.image.clone().or_else(|| self.gallery.first().cloned()),
        }
    }
}

/// A product as entered in the admin form, before the backend assigns it a place
/// in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl NewProduct {
    /// A local draft of this product, identified by its SKU.
    #[must_use]
    pub fn to_draft(&self) -> Product {
        Product {
            id: ProductId::new(self.sku.clone()),
            sku: Some(self.sku.clone()),
            name: self.name.clone(),
            brand: self.brand.clone(),
            price: self.price,
            category: self.category.clone(),
            in_stock: self.in_stock,
            attributes: Vec::new(),
            image: self.image.clone(),
            gallery: Vec::new(),
            description: self.description.clone(),
        }
    }
}

/// Merge backend products with locally drafted ones, de-duplicated by id.
/// Backend entries win and keep their order; local drafts follow.
#[must_use]
pub fn merge_products(backend: Vec<Product>, local: Vec<Product>) -> Vec<Product> {
    let mut merged: Vec<Product> = Vec::with_capacity(backend.len() + local.len());
    for product in backend.into_iter().chain(local) {
        if !merged.iter().any(|p| p.id == product.id) {
            merged.push(product);
        }
    }
    merged
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::{attribute, product};
    use super::*;

    fn iphone() -> Product {
        product(
            "iphone",
            "tech",
            vec![
                attribute("Capacity", "text", &["512G", "1T"]),
                attribute("Color", "swatch", &["#44FF03", "#030BFF"]),
            ],
        )
    }

    #[test]
    fn test_attribute_groups_merge_duplicates() {
        let mut p = iphone();
        p.attributes
            .push(attribute("Capacity", "text", &["1T", "2T"]));
        let groups = p.attribute_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Capacity");
        assert_eq!(groups[0].values, vec!["512G", "1T", "2T"]);
        assert_eq!(groups[1].kind, AttributeKind::Swatch);
    }

    #[test]
    fn test_check_add_to_cart_requires_every_group() {
        let p = iphone();
        let partial = SelectedAttributes::from([("Capacity", "512G")]);
        assert_eq!(
            p.check_add_to_cart(&partial),
            Err(AddToCartError::MissingAttribute("Color".to_string()))
        );

        let full = partial.with("Color", "#44FF03");
        assert_eq!(p.check_add_to_cart(&full), Ok(()));
    }

    #[test]
    fn test_check_add_to_cart_rejects_unknown_values() {
        let p = iphone();
        let bad = SelectedAttributes::from([("Capacity", "64G"), ("Color", "#44FF03")]);
        assert!(matches!(
            p.check_add_to_cart(&bad),
            Err(AddToCartError::UnknownValue { .. })
        ));

        let extra = SelectedAttributes::from([
            ("Capacity", "1T"),
            ("Color", "#44FF03"),
            ("Size", "M"),
        ]);
        assert_eq!(
            p.check_add_to_cart(&extra),
            Err(AddToCartError::UnknownAttribute("Size".to_string()))
        );
    }

    #[test]
    fn test_out_of_stock() {
        let mut p = product("airpods", "tech", Vec::new());
        p.in_stock = false;
        assert!(!p.quick_add_allowed());
        assert_eq!(
            p.check_add_to_cart(&SelectedAttributes::new()),
            Err(AddToCartError::OutOfStock(ProductId::new("airpods")))
        );
    }

    #[test]
    fn test_quick_add_only_without_attributes() {
        assert!(product("ps5", "tech", Vec::new()).quick_add_allowed());
        assert!(!iphone().quick_add_allowed());
    }

    #[test]
    fn test_to_line_item_projection() {
        let mut p = product("ps5", "tech", Vec::new());
        p.image = None;
        p.gallery = vec!["https://img/ps5-1.png".to_string()];
        let line = p.to_line_item(SelectedAttributes::new(), 3);
        assert_eq!(line.product_id, ProductId::new("ps5"));
        assert_eq!(line.unit_price, Decimal::new(1000, 2));
        assert_eq!(line.quantity, 3);
        assert_eq!(line.image_ref.as_deref(), Some("https://img/ps5-1.png"));
    }

    #[test]
    fn test_merge_products_dedupes_by_id() {
        let backend = vec![product("a", "tech", Vec::new()), product("b", "tech", Vec::new())];
        let mut draft = product("a", "clothes", Vec::new());
        draft.name = "Draft".to_string();
        let local = vec![draft, product("c", "clothes", Vec::new())];

        let merged = merge_products(backend, local);
        let ids: Vec<&str> = merged.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[0].category, "tech");
    }

    #[test]
    fn test_new_product_draft_defaults_in_stock() {
        let new: NewProduct = serde_json::from_str(
            r#"{"sku":"SKU-9","name":"Scarf","price":"12.50","category":"clothes"}"#,
        )
        .unwrap();
        let draft = new.to_draft();
        assert_eq!(draft.id, ProductId::new("SKU-9"));
        assert!(draft.in_stock);
        assert!(draft.quick_add_allowed());
        assert_eq!(draft.price, Decimal::new(1250, 2));
    }
}
