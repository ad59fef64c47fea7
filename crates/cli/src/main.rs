//! GoMarketplace CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the stored cart
//! gomarket-cart show
//!
//! # Show it as JSON (the stored format)
//! gomarket-cart show --json
//!
//! # Add a product (increments it if already present)
//! gomarket-cart add --id A --title Widget --image-url https://img/a.png --price 10
//!
//! # Change quantities
//! gomarket-cart increment A
//! gomarket-cart decrement A
//! ```
//!
//! # Environment Variables
//!
//! See `gomarket_cart::config` for `CART_STORAGE_KEY`, `CART_STORAGE_DIR`,
//! `CART_WRITE_RETRIES` and `CART_RETRY_BACKOFF_MS`. `--dir` and `--key`
//! override the first two.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gomarket_cart::CartConfig;
use gomarket_core::{NewCartItem, Price};

mod commands;

#[derive(Parser)]
#[command(name = "gomarket-cart")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    /// Directory holding the stored cart (overrides `CART_STORAGE_DIR`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Key the cart is stored under (overrides `CART_STORAGE_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored cart
    Show {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product, or increment it if already in the cart
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Display image URL
        #[arg(long)]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: Price,

        /// Print the resulting entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Product ID
        id: String,

        /// Print the resulting entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decrease a product's quantity by one, removing it at zero
    Decrement {
        /// Product ID
        id: String,

        /// Print the resulting entries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `--json` output stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gomarket_cart=info,gomarket_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CartConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.storage_dir = dir;
    }
    if let Some(key) = cli.key {
        config.storage_key = key;
    }

    let (items, json) = match cli.command {
        Commands::Show { json } => (commands::cart::show(&config).await?, json),
        Commands::Add {
            id,
            title,
            image_url,
            price,
            json,
        } => {
            let item = NewCartItem::new(id, title, image_url, price);
            (commands::cart::add(&config, item).await?, json)
        }
        Commands::Increment { id, json } => (commands::cart::increment(&config, &id).await?, json),
        Commands::Decrement { id, json } => (commands::cart::decrement(&config, &id).await?, json),
    };

    commands::cart::print(&items, json)?;
    Ok(())
}
