//! Core types for Fjord Store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod attributes;
pub mod cart;
pub mod catalog;
pub mod category;
pub mod id;
pub mod order;
pub mod price;

pub use attributes::SelectedAttributes;
pub use cart::{CartLineItem, subtotal, total_quantity};
pub use catalog::{
    AddToCartError, AttributeGroup, AttributeItem, AttributeKind, AttributeSet, NewProduct, Product,
    merge_products,
};
pub use category::{Category, filter_products};
pub use id::*;
pub use order::{OrderConfirmation, OrderLine, OrderRequest};
pub use price::{CurrencyCode, CurrencyError, Price, round_money};
