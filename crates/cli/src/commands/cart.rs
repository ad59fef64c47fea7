//! Cart commands.
//!
//! Each command opens a file-backed store, hydrates it, applies at most one
//! mutation and waits for the write before returning the resulting entries.

use std::fmt::Write as _;
use std::sync::Arc;

use gomarket_cart::{CartConfig, CartError, CartStore, FileStore};
use gomarket_core::{CartItem, NewCartItem};
use tracing::info;

async fn open(config: &CartConfig) -> CartStore {
    let storage = Arc::new(FileStore::new(config.storage_dir.clone()));
    CartStore::open(storage, config).await
}

/// Load the stored cart.
///
/// # Errors
///
/// Never fails today; unreadable data is treated as an empty cart.
pub async fn show(config: &CartConfig) -> Result<Vec<CartItem>, CartError> {
    Ok(open(config).await.products())
}

/// Add a product and persist the cart.
///
/// # Errors
///
/// Returns an error if the updated cart could not be written.
pub async fn add(config: &CartConfig, item: NewCartItem) -> Result<Vec<CartItem>, CartError> {
    let store = open(config).await;
    let id = item.id.clone();
    let outcome = store.add_to_cart(item);
    store.flush().await?;

    info!(product_id = %id, ?outcome, "Cart updated");
    Ok(store.products())
}

/// Increment a product and persist the cart.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the write failed.
pub async fn increment(config: &CartConfig, id: &str) -> Result<Vec<CartItem>, CartError> {
    let store = open(config).await;
    let quantity = store.increment(id)?;
    store.flush().await?;

    info!(product_id = %id, quantity, "Cart updated");
    Ok(store.products())
}

/// Decrement a product and persist the cart.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the write failed.
pub async fn decrement(config: &CartConfig, id: &str) -> Result<Vec<CartItem>, CartError> {
    let store = open(config).await;
    let outcome = store.decrement(id)?;
    store.flush().await?;

    info!(product_id = %id, ?outcome, "Cart updated");
    Ok(store.products())
}

/// Format entries as a table, or as the stored JSON array.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(items: &[CartItem], json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(items);
    }

    if items.is_empty() {
        return Ok("Cart is empty".to_string());
    }

    let id_width = items
        .iter()
        .map(|item| item.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<id_width$}  {:>5}  {:>10}  TITLE", "ID", "QTY", "PRICE");
    for item in items {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>5}  {:>10}  {}",
            item.id.as_str(),
            item.quantity,
            item.price.to_string(),
            item.title
        );
    }
    let total: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();
    let _ = write!(out, "{} products, {total} items", items.len());

    Ok(out)
}

/// Print entries to stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
#[allow(clippy::print_stdout)]
pub fn print(items: &[CartItem], json: bool) -> Result<(), serde_json::Error> {
    println!("{}", render(items, json)?);
    Ok(())
}
