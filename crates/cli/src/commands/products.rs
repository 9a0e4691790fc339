//! Catalog commands.

use fjord_core::{Category, CurrencyCode, NewProduct, Product, ProductId, filter_products, merge_products};
use tracing::info;

use super::{CliError, Context};

/// List products in `category`, merged with local drafts when asked.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or drafts cannot be read.
pub async fn list(ctx: &Context, category: &str, include_drafts: bool) -> Result<(), CliError> {
    let backend = ctx.client()?.products().await?;
    let products = if include_drafts {
        merge_products(backend.as_ref().clone(), ctx.drafts()?)
    } else {
        backend.as_ref().clone()
    };

    let category = Category::from_slug(category);
    print_listing(&filter_products(&products, &category), ctx.currency);
    Ok(())
}

/// Show a product and its attribute options.
///
/// # Errors
///
/// Returns an error if the product does not exist or the backend fails.
pub async fn show(ctx: &Context, id: &str) -> Result<(), CliError> {
    let product = ctx.client()?.product(&ProductId::new(id)).await?;
    print_product(&product, ctx.currency);
    Ok(())
}

/// Create `product` on the backend, or store it as a local draft.
///
/// # Errors
///
/// Returns an error if the backend rejects the product or the draft cannot be saved.
pub async fn create(ctx: &Context, product: &NewProduct, draft_only: bool) -> Result<(), CliError> {
    let created = if draft_only {
        let draft = product.to_draft();
        ctx.save_draft(draft.clone())?;
        info!(sku = %product.sku, "Saved product draft");
        draft
    } else {
        ctx.client()?.create_product(product).await?
    };
    print_product(&created, ctx.currency);
    Ok(())
}

/// Delete products from the backend.
///
/// # Errors
///
/// Returns an error if the request fails or the backend reports failure.
#[allow(clippy::print_stdout)]
pub async fn delete(ctx: &Context, ids: &[String]) -> Result<(), CliError> {
    let ids: Vec<ProductId> = ids.iter().map(|id| ProductId::new(id.as_str())).collect();
    if !ctx.client()?.delete_products(&ids).await? {
        return Err(CliError::DeleteRefused);
    }
    println!("Deleted {} product(s)", ids.len());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_listing(products: &[&Product], currency: CurrencyCode) {
    if products.is_empty() {
        println!("No products");
        return;
    }
    for product in products {
        let stock = if product.in_stock { "" } else { "  (out of stock)" };
        println!(
            "{:<28} {:<32} {:>10}{stock}",
            product.id,
            product.name,
            currency.format(product.price)
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_product(product: &Product, currency: CurrencyCode) {
    println!("{} ({})", product.name, product.id);
    if let Some(brand) = &product.brand {
        println!("  brand:    {brand}");
    }
    println!("  category: {}", product.category);
    println!("  price:    {}", currency.format(product.price));
    println!("  in stock: {}", if product.in_stock { "yes" } else { "no" });
    for group in product.attribute_groups() {
        println!("  {}: {}", group.name, group.values.join(" | "));
    }
    if product.quick_add_allowed() {
        println!("  (no options to choose)");
    }
}
