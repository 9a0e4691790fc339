//! Fjord CLI - browse the catalog, manage a local cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! fjord products list --category tech --currency EUR
//! fjord products show apple-iphone-12-pro
//!
//! # Cart (stored in --cart-dir, default $FJORD_CART_DIR or .fjord)
//! fjord cart add apple-iphone-12-pro -a Capacity=512G -a Color=#44FF03 -q 2
//! fjord cart update apple-iphone-12-pro -a Capacity=512G -a Color=#44FF03 -q 1
//! fjord cart show
//! fjord checkout
//!
//! # Catalog admin
//! fjord products create --sku SCARF-1 --name Scarf --price 12.50 --category clothes
//! fjord products delete SCARF-1
//! ```
//!
//! # Environment Variables
//!
//! - `FJORD_GRAPHQL_URL` - Backend endpoint
//! - `FJORD_API_TOKEN` - Optional bearer token
//! - `FJORD_CART_DIR` - Default cart directory
//! - `FJORD_CURRENCY` - Default display currency

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fjord_core::CurrencyCode;
use rust_decimal::Decimal;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "fjord")]
#[command(author, version, about = "Fjord Store command-line storefront")]
struct Cli {
    /// Directory holding the local cart and product drafts
    #[arg(long, global = true, env = "FJORD_CART_DIR", default_value = ".fjord")]
    cart_dir: PathBuf,

    /// Display currency (USD, EUR, GBP)
    #[arg(long, global = true, env = "FJORD_CURRENCY", default_value = "USD")]
    currency: CurrencyCode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered by category
    List {
        /// Category slug (all, clothes, tech, ...)
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Include local drafts that the backend does not know yet
        #[arg(long)]
        drafts: bool,
    },
    /// Show one product with its attribute options
    Show {
        /// Product ID
        id: String,
    },
    /// Create a product on the backend (or save it as a local draft)
    Create(CreateProductArgs),
    /// Delete products from the backend
    Delete {
        /// Product IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args)]
struct CreateProductArgs {
    #[arg(long)]
    sku: String,
    #[arg(long)]
    name: String,
    /// Price in USD
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    category: String,
    #[arg(long)]
    brand: Option<String>,
    /// Image URL
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Mark the product as out of stock
    #[arg(long)]
    out_of_stock: bool,
    /// Only save a local draft, do not contact the backend
    #[arg(long)]
    draft: bool,
}

#[derive(Args)]
struct LineArgs {
    /// Product ID
    id: String,

    /// Selected attribute, repeatable (`-a Size=M`)
    #[arg(short = 'a', long = "attribute", value_parser = commands::cart::parse_attribute)]
    attributes: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product variant
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (values below 1 are ignored)
    Update {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::new(&cli.cart_dir, cli.currency)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { category, drafts } => {
                commands::products::list(&ctx, &category, drafts).await?;
            }
            ProductsAction::Show { id } => commands::products::show(&ctx, &id).await?,
            ProductsAction::Create(args) => {
                let product = fjord_core::NewProduct {
                    sku: args.sku,
                    name: args.name,
                    price: args.price,
                    category: args.category,
                    brand: args.brand,
                    image: args.image,
                    description: args.description,
                    in_stock: !args.out_of_stock,
                };
                commands::products::create(&ctx, &product, args.draft).await?;
            }
            ProductsAction::Delete { ids } => commands::products::delete(&ctx, &ids).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { line, quantity } => {
                commands::cart::add(&ctx, &line.id, line.attributes, quantity).await?;
            }
            CartAction::Update { line, quantity } => {
                commands::cart::update(&ctx, &line.id, line.attributes, quantity);
            }
            CartAction::Remove { line } => commands::cart::remove(&ctx, &line.id, line.attributes),
        },
        Commands::Checkout => commands::checkout::run(&ctx).await?,
    }
    Ok(())
}
