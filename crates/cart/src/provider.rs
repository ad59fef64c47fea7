//! Ambient cart access for presentation code.
//!
//! Most code should take a [`CartStore`] explicitly. Views that are built far
//! from where the store is created can instead run inside
//! [`CartProvider::scope`] and call [`use_cart`], which fails loudly with
//! `CartError::MissingProvider` rather than handing out a default cart.

use std::future::Future;

use gomarket_core::{CartItem, NewCartItem};

use crate::cart::{AddOutcome, DecrementOutcome};
use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// Installs a [`CartStore`] as the ambient cart for a future.
pub struct CartProvider;

impl CartProvider {
    /// Run `f` with `store` available through [`use_cart`].
    ///
    /// Starts hydrating the store in the background if that has not happened
    /// yet; `f` starts immediately and may observe the empty cart until the
    /// stored one is loaded.
    pub async fn scope<F>(store: CartStore, f: F) -> F::Output
    where
        F: Future,
    {
        // Hydration is tracked by the store itself, the handle is not needed
        drop(store.spawn_hydrate());
        CURRENT_CART.scope(store, f).await
    }
}

/// Access the cart installed by the enclosing [`CartProvider::scope`].
///
/// # Errors
///
/// Returns `CartError::MissingProvider` when called outside a provider scope.
pub fn use_cart() -> Result<CartContext> {
    CURRENT_CART
        .try_with(|store| CartContext {
            store: store.clone(),
        })
        .map_err(|_| CartError::MissingProvider)
}

/// The cart operations exposed to presentation code.
#[derive(Debug, Clone)]
pub struct CartContext {
    store: CartStore,
}

impl CartContext {
    /// Current cart entries.
    #[must_use]
    pub fn products(&self) -> Vec<CartItem> {
        self.store.products()
    }

    /// Add a product, or increment it if already present.
    pub fn add_to_cart(&self, item: NewCartItem) -> AddOutcome {
        self.store.add_to_cart(item)
    }

    /// Increase a product's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` if the product is not in the cart.
    pub fn increment(&self, id: &str) -> Result<u32> {
        self.store.increment(id)
    }

    /// Decrease a product's quantity by one, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` if the product is not in the cart.
    pub fn decrement(&self, id: &str) -> Result<DecrementOutcome> {
        self.store.decrement(id)
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }
}
