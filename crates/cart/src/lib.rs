//! GoMarketplace cart - shopping cart state with persistence.
//!
//! This crate keeps the authoritative in-memory cart for one client and keeps
//! a key-value store eventually consistent with it.
//!
//! # Architecture
//!
//! - [`Cart`] - Pure state machine: unique entries, quantities never below 1
//! - [`CartStore`] - Shared handle that owns a `Cart`, notifies subscribers,
//!   and schedules a write after every mutation
//! - [`KeyValueStore`] - Async storage seam with [`MemoryStore`] and
//!   [`FileStore`] backends
//! - [`CartProvider`] - Task-local ambient access for presentation code
//!
//! # Lifecycle
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), gomarket_cart::CartError> {
//! use std::sync::Arc;
//!
//! use gomarket_cart::{CartConfig, CartStore, MemoryStore};
//! use gomarket_core::{NewCartItem, Price};
//!
//! let config = CartConfig::default();
//! let store = CartStore::open(Arc::new(MemoryStore::new()), &config).await;
//!
//! store.add_to_cart(NewCartItem::new("A", "Widget", "https://img/a.png", Price::from_units(10)));
//! store.increment("A")?;
//! assert_eq!(store.products()[0].quantity, 2);
//!
//! store.flush().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;
mod writer;

pub use cart::{AddOutcome, Cart, DecrementOutcome};
pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use error::{CartError, Result, StorageError};
pub use provider::{CartContext, CartProvider, use_cart};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{CartStatus, CartStore, CartSubscriber};
