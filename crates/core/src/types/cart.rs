//! Cart line items and cart-level derived values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attributes::SelectedAttributes;
use super::id::ProductId;

/// One entry in the cart: a concrete product variant and its quantity.
///
/// Identity is `(product_id, selected_attributes)`; see [`CartLineItem::is_same_slot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    /// Price of one unit in the base currency.
    pub unit_price: Decimal,
    #[serde(default)]
    pub selected_attributes: SelectedAttributes,
    pub quantity: u32,
    /// Opaque display reference (image URL). Never used for identity or pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CartLineItem {
    /// Create a line item without an image reference.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        selected_attributes: SelectedAttributes,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            selected_attributes,
            quantity,
            image_ref: None,
        }
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Whether this line is the slot for `product_id` + `selected_attributes`.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, selected_attributes: &SelectedAttributes) -> bool {
        self.product_id == *product_id && self.selected_attributes == *selected_attributes
    }

    /// Whether two lines share identity. Quantity, name, price and image are ignored.
    #[must_use]
    pub fn is_same_slot(&self, other: &Self) -> bool {
        self.matches(&other.product_id, &other.selected_attributes)
    }

    /// `unit_price × quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals, unrounded. Round with [`super::price::round_money`] for display.
#[must_use]
pub fn subtotal(lines: &[CartLineItem]) -> Decimal {
    lines.iter().map(CartLineItem::line_total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn total_quantity(lines: &[CartLineItem]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jacket(size: &str, quantity: u32) -> CartLineItem {
        CartLineItem::new(
            "jacket",
            "Jacket",
            Decimal::new(51_847, 2),
            SelectedAttributes::from([("Size", size)]),
            quantity,
        )
    }

    #[test]
    fn test_identity_ignores_quantity() {
        assert!(jacket("M", 1).is_same_slot(&jacket("M", 4)));
        assert!(!jacket("M", 1).is_same_slot(&jacket("L", 1)));
    }

    #[test]
    fn test_subtotal_and_quantity() {
        let lines = vec![jacket("M", 2), jacket("L", 1)];
        assert_eq!(subtotal(&lines), Decimal::new(155_541, 2));
        assert_eq!(total_quantity(&lines), 3);
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_json_shape() {
        let line = jacket("M", 2).with_image("https://img/jacket.png");
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["productId"], "jacket");
        assert_eq!(json["unitPrice"], "518.47");
        assert_eq!(json["selectedAttributes"]["Size"], "M");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["imageRef"], "https://img/jacket.png");
    }

    #[test]
    fn test_accepts_numeric_price() {
        let line: CartLineItem = serde_json::from_str(
            r#"{"productId":"p1","name":"P","unitPrice":10.5,"quantity":1}"#,
        )
        .unwrap();
        assert_eq!(line.unit_price, Decimal::new(105, 1));
        assert!(line.selected_attributes.is_empty());
        assert!(line.image_ref.is_none());
    }
}
