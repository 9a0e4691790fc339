//! Local cart commands.

use fjord_core::{CurrencyCode, ProductId, SelectedAttributes};
use fjord_storefront::cart::CartStore;
use tracing::info;

use super::{CliError, Context};

/// Parse a `Name=Value` attribute selection.
///
/// # Errors
///
/// Returns a message if there is no `=` or the name is empty.
pub fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Name=Value, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("attribute name is empty in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Print cart lines and totals.
pub fn show(ctx: &Context) {
    print_cart(&ctx.cart(), ctx.currency);
}

/// Look the product up, validate the selection and add it.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched, is out of stock, or the
/// selection is incomplete.
pub async fn add(
    ctx: &Context,
    id: &str,
    attributes: Vec<(String, String)>,
    quantity: u32,
) -> Result<(), CliError> {
    let selections: SelectedAttributes = attributes.into_iter().collect();
    let product = ctx.client()?.product(&ProductId::new(id)).await?;
    product.check_add_to_cart(&selections)?;

    let cart = ctx.cart();
    cart.add_item(product.to_line_item(selections, quantity.max(1)));
    info!(product_id = %id, quantity, "Added to cart");
    print_cart(&cart, ctx.currency);
    Ok(())
}

/// Set a line's quantity. Values below 1 leave the cart unchanged.
pub fn update(ctx: &Context, id: &str, attributes: Vec<(String, String)>, quantity: i64) {
    let selections: SelectedAttributes = attributes.into_iter().collect();
    let cart = ctx.cart();
    cart.update_quantity(&ProductId::new(id), &selections, quantity);
    print_cart(&cart, ctx.currency);
}

/// Remove a line.
pub fn remove(ctx: &Context, id: &str, attributes: Vec<(String, String)>) {
    let selections: SelectedAttributes = attributes.into_iter().collect();
    let cart = ctx.cart();
    cart.remove_item(&ProductId::new(id), &selections);
    print_cart(&cart, ctx.currency);
}

fn describe_attributes(selections: &SelectedAttributes) -> String {
    if selections.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = selections
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!(" [{}]", parts.join(", "))
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &CartStore, currency: CurrencyCode) {
    let lines = cart.items();
    if lines.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in &lines {
        println!(
            "{:>3} x {}{}  {} each  {}",
            line.quantity,
            line.name,
            describe_attributes(&line.selected_attributes),
            currency.format(line.unit_price),
            currency.format(line.line_total()),
        );
    }
    println!(
        "{} items, total {}",
        fjord_core::total_quantity(&lines),
        currency.format(fjord_core::subtotal(&lines))
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("Color=#44FF03").unwrap(),
            ("Color".to_string(), "#44FF03".to_string())
        );
        assert_eq!(
            parse_attribute("Size = M").unwrap(),
            ("Size".to_string(), "M".to_string())
        );
        assert!(parse_attribute("Size").is_err());
        assert!(parse_attribute("=M").is_err());
    }

    #[test]
    fn test_describe_attributes_sorted_by_name() {
        let selections = SelectedAttributes::from([("Size", "M"), ("Color", "red")]);
        assert_eq!(describe_attributes(&selections), " [Color=red, Size=M]");
        assert_eq!(describe_attributes(&SelectedAttributes::new()), "");
    }
}
