//! SpiceHub CLI - database migrations and a file-backed cart profile.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (orders and sessions)
//! spicehub migrate
//!
//! # Work with the cart kept in the profile directory
//! spicehub cart add --id masala1 --name "Garam Masala" --price 12.99 --image /img/masala.jpg
//! spicehub cart show
//!
//! # Price the cart as the checkout would
//! spicehub checkout quote --shipping express
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run storefront database migrations
//! - `cart` - Show and change the profile cart
//! - `checkout quote` - Subtotal, shipping, tax, and total for the profile cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use spicehub_core::cart::parse_unit_price;
use spicehub_core::{CartStore, ShippingMethod};

use crate::commands::cart::NewLine;
use crate::storage::FileStorage;

mod commands;
mod storage;

#[derive(Parser)]
#[command(name = "spicehub")]
#[command(author, version, about = "SpiceHub CLI tools")]
struct Cli {
    /// Directory holding the cart profile
    #[arg(long, global = true, env = "SPICEHUB_PROFILE_DIR", default_value = ".spicehub")]
    profile_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Show and change the profile cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Checkout pricing
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the subtotal
    Show,
    /// Add a product, merging with an existing line
    Add {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        /// Unit price, e.g. 12.99 (at most 1,000,000.00)
        #[arg(long, value_parser = parse_unit_price)]
        price: Decimal,

        #[arg(long)]
        image: String,

        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,

        /// Price before discount
        #[arg(long, value_parser = parse_unit_price)]
        original_price: Option<Decimal>,

        /// Display weight, e.g. "100g"
        #[arg(long)]
        weight: Option<String>,
    },
    /// Set a line's quantity (zero or less removes it)
    Update {
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Total number of units
    Count,
    /// Cart subtotal
    Total,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Price the cart with a shipping option
    Quote {
        /// `standard`, `express`, or `overnight`
        #[arg(long, default_value = "standard")]
        shipping: ShippingMethod,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Some(output)) => print(&output),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

#[allow(clippy::print_stdout)]
fn print(output: &str) {
    println!("{output}");
}

async fn run(cli: Cli) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let output = match cli.command {
        Commands::Migrate => {
            commands::migrate::storefront().await?;
            None
        }
        Commands::Cart { action } => {
            let storage = FileStorage::new(&cli.profile_dir);
            tracing::debug!(profile = %storage.dir().display(), "Opened cart profile");
            let mut cart = CartStore::new(storage);
            Some(match action {
                CartAction::Show => commands::cart::render(&cart),
                CartAction::Add {
                    id,
                    name,
                    price,
                    image,
                    quantity,
                    original_price,
                    weight,
                } => commands::cart::add(
                    &mut cart,
                    NewLine {
                        id,
                        name,
                        price,
                        image,
                        quantity,
                        original_price,
                        weight,
                    },
                ),
                CartAction::Update { id, quantity } => {
                    commands::cart::update(&mut cart, &id, quantity)
                }
                CartAction::Remove { id } => commands::cart::remove(&mut cart, &id),
                CartAction::Clear => commands::cart::clear(&mut cart),
                CartAction::Count => commands::cart::count(&cart),
                CartAction::Total => commands::cart::total(&cart),
            })
        }
        Commands::Checkout { action } => match action {
            CheckoutAction::Quote { shipping } => {
                let cart = CartStore::new(FileStorage::new(&cli.profile_dir));
                Some(commands::checkout::quote(&cart, shipping)?)
            }
        },
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_rejects_out_of_range_price() {
        let base = ["spicehub", "cart", "add", "--id", "x", "--name", "X", "--image", "x.jpg"];
        for price in ["50000000000000000000000000000", "12.999", "-1"] {
            let args = base.iter().copied().chain(["--price", price]);
            assert!(Cli::try_parse_from(args).is_err(), "accepted {price}");
        }
        let args = base.iter().copied().chain(["--price", "12.99"]);
        assert!(Cli::try_parse_from(args).is_ok());
    }
}
