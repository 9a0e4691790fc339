//! Checkout command.

use std::sync::Arc;

use fjord_storefront::cart::CheckoutSubmitter;

use super::{CliError, Context};

/// Submit the local cart as an order. The cart is cleared only on success.
///
/// # Errors
///
/// Returns an error if the cart is empty or the backend rejects the order;
/// the cart is left untouched in both cases.
#[allow(clippy::print_stdout)]
pub async fn run(ctx: &Context) -> Result<(), CliError> {
    let submitter = CheckoutSubmitter::new(Arc::new(ctx.client()?));
    let confirmation = submitter.submit(&ctx.cart()).await?;

    println!("Order placed successfully!");
    println!("  order: {}", confirmation.id);
    println!("  total: {}", ctx.currency.format(confirmation.total));
    Ok(())
}
