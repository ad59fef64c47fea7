//! Integration tests for GoMarketplace cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Write/hydrate round trips through real backends
//! - `cart_lifecycle` - Hydration states, provider scope, ordering under load
//!
//! This library holds the shared fixtures.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gomarket_cart::{CartConfig, CartStore, FileStore, KeyValueStore};
use gomarket_core::{NewCartItem, Price};
use tempfile::TempDir;

/// A unique scratch directory with a `FileStore` rooted in it.
///
/// The directory is removed when the context is dropped, including when a
/// test panics.
pub struct TestContext {
    dir: TempDir,
    pub config: CartConfig,
}

impl TestContext {
    /// Create a context with a fresh directory and fast retry settings.
    ///
    /// # Panics
    ///
    /// Panics if the scratch directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let dir = TempDir::with_prefix("gomarket-it-").expect("failed to create scratch directory");
        let config = CartConfig {
            storage_dir: dir.path().to_path_buf(),
            retry_backoff: Duration::from_millis(1),
            ..CartConfig::default()
        };
        Self { dir, config }
    }

    /// The scratch directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// A file-backed storage handle for this context.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileStore::new(self.dir()))
    }

    /// Open and hydrate a store over this context's directory.
    pub async fn open_store(&self) -> CartStore {
        CartStore::open(self.storage(), &self.config).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog product with the given ID and a whole-unit price.
#[must_use]
pub fn product(id: &str, title: &str, price: i64) -> NewCartItem {
    NewCartItem::new(id, title, format!("https://cdn.example.com/{id}.png"), Price::from_units(price))
}
