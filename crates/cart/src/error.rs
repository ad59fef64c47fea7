//! Error types for cart operations and storage backends.

use std::sync::Arc;

use gomarket_core::ProductId;
use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend.
///
/// Cloneable so one failed write can be reported to every pending flush.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// Backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Errors surfaced to cart callers.
///
/// Storage failures during hydration and background writes are logged and
/// recovered from; they only reach callers through
/// [`CartStore::flush`](crate::CartStore::flush).
#[derive(Debug, Error)]
pub enum CartError {
    /// `increment`/`decrement` named a product that is not in the cart.
    #[error("Product not in cart: {0}")]
    UnknownId(ProductId),

    /// The cart was accessed outside of a [`CartProvider`](crate::CartProvider) scope.
    #[error("use_cart must be called within a CartProvider scope")]
    MissingProvider,

    /// The most recent persistence write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The background writer is no longer running.
    #[error("Persistence writer has shut down")]
    WriterClosed,

    /// The store behind a subscription was dropped.
    #[error("Cart store has been dropped")]
    Closed,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
