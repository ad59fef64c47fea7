//! Shared cart store.
//!
//! [`CartStore`] owns the authoritative [`Cart`] for one client. Every
//! mutation:
//!
//! 1. runs against the in-memory cart under its lock,
//! 2. serializes that same updated cart and queues it for the writer task
//!    before the lock is released, so queued writes follow mutation order,
//! 3. notifies subscribers so dependents re-read.
//!
//! Storage is only touched asynchronously (hydration and the writer task);
//! mutations and reads never wait on it.
//!
//! # Lifecycle
//!
//! `Created` → `Hydrating` → `Ready`. [`CartStore::open`] runs the whole
//! sequence; [`CartStore::new`] plus [`CartStore::spawn_hydrate`] lets the
//! caller use the (empty) cart while the stored one loads.
//!
//! Changes made before hydration finishes are kept in memory and merged into
//! the stored cart once it is loaded. They are not written until then, so the
//! stored cart is never overwritten by a partial one.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gomarket_core::{CartItem, NewCartItem};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::cart::{AddOutcome, Cart, DecrementOutcome};
use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::storage::KeyValueStore;
use crate::writer::{PersistHandle, RetryPolicy};

/// Hydration state of a [`CartStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    /// Constructed; the stored cart has not been requested yet.
    Created,
    /// The stored cart is being loaded.
    Hydrating,
    /// Hydration finished (successfully or by falling back to empty).
    Ready,
}

#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    /// Number of mutations applied so far.
    revision: u64,
    /// Set once the stored cart has been merged in; writes wait for it.
    hydrated: bool,
}

/// Shared handle to a cart and its persistence.
///
/// Cheaply cloneable via `Arc`; all clones see the same cart. Must be created
/// inside a Tokio runtime because it spawns the persistence writer.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage_key: String,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<CartState>,
    changes: watch::Sender<Vec<CartItem>>,
    status: watch::Sender<CartStatus>,
    hydration_started: AtomicBool,
    writer: PersistHandle,
}

impl CartStore {
    /// Create a store with an empty cart.
    ///
    /// The stored cart is not loaded until [`hydrate`](Self::hydrate) runs.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let writer = PersistHandle::spawn(
            Arc::clone(&storage),
            config.storage_key.clone(),
            RetryPolicy {
                retries: config.write_retries,
                backoff: config.retry_backoff,
            },
        );

        Self {
            inner: Arc::new(CartStoreInner {
                storage_key: config.storage_key.clone(),
                storage,
                state: Mutex::new(CartState::default()),
                changes: watch::Sender::new(Vec::new()),
                status: watch::Sender::new(CartStatus::Created),
                hydration_started: AtomicBool::new(false),
                writer,
            }),
        }
    }

    /// Create a store and wait for hydration to finish.
    pub async fn open(storage: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let store = Self::new(storage, config);
        store.hydrate().await;
        store
    }

    /// Load the stored cart into memory and wait for it.
    ///
    /// The load runs at most once per store, on its own task, so dropping
    /// this future (a timeout, a losing `select!` branch) does not interrupt
    /// it; [`ready`](Self::ready) still resolves. Missing, unreadable, or
    /// malformed data leaves the cart empty.
    ///
    /// If the cart was changed before loading finished, those changes are
    /// merged into the stored cart: stored entries keep their order and
    /// fields, quantities of products in both are added together, and new
    /// products are appended. The merged cart is then written back.
    pub async fn hydrate(&self) {
        if !self.inner.hydration_started.swap(true, Ordering::AcqRel) {
            let store = self.clone();
            tokio::spawn(async move { store.load().await });
        }
        self.ready().await;
    }

    /// Hydrate on a background task.
    #[must_use = "the handle can be awaited to know when hydration finished"]
    pub fn spawn_hydrate(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move { store.hydrate().await })
    }

    /// Wait until hydration has finished.
    ///
    /// Waits forever if nothing ever calls `hydrate`.
    pub async fn ready(&self) {
        let mut status = self.inner.status.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = status.wait_for(|s| *s == CartStatus::Ready).await;
    }

    /// Current hydration state.
    #[must_use]
    pub fn status(&self) -> CartStatus {
        *self.inner.status.borrow()
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    #[instrument(skip(self), fields(key = %self.inner.storage_key))]
    async fn load(&self) {
        self.inner.status.send_replace(CartStatus::Hydrating);

        let items = match self.inner.storage.get(&self.inner.storage_key).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<CartItem>>(&blob) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "Stored cart is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored cart, starting empty");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to read stored cart, starting empty");
                Vec::new()
            }
        };

        let loaded = Cart::from_items(items);
        let count = {
            let mut state = self.lock_state();
            let pending = std::mem::take(&mut state.cart);
            if state.revision > 0 {
                info!(
                    mutations = state.revision,
                    "Merging changes made before hydration into stored cart"
                );
            }
            state.cart = loaded.merge(pending);
            state.hydrated = true;
            if state.revision > 0 {
                self.inner.writer.schedule(state.cart.items());
            }
            self.inner.changes.send_replace(state.cart.items().to_vec());
            state.cart.len()
        };

        self.inner.status.send_replace(CartStatus::Ready);
        info!(items = count, "Cart hydrated");
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the cart entries in order.
    #[must_use]
    pub fn products(&self) -> Vec<CartItem> {
        self.lock_state().cart.items().to_vec()
    }

    /// Snapshot of the whole cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock_state().cart.clone()
    }

    /// Snapshot of one entry.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<CartItem> {
        self.lock_state().cart.get(id).cloned()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().cart.len()
    }

    /// Returns `true` if the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_state().cart.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lock_state().cart.total_quantity()
    }

    /// Subscribe to cart changes.
    ///
    /// The subscriber is notified after every mutation and after hydration.
    #[must_use]
    pub fn subscribe(&self) -> CartSubscriber {
        CartSubscriber {
            rx: self.inner.changes.subscribe(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product, or increment it if it is already in the cart.
    pub fn add_to_cart(&self, item: NewCartItem) -> AddOutcome {
        let id = item.id.clone();
        let Ok(outcome) = self.mutate(|cart| Ok::<_, Infallible>(cart.add(item)));
        debug!(product_id = %id, ?outcome, "Added to cart");
        outcome
    }

    /// Increase a product's quantity by one and return the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` if the product is not in the cart. The
    /// cart is left unchanged and nothing is written.
    pub fn increment(&self, id: &str) -> Result<u32> {
        let result = self.mutate(|cart| cart.increment(id));
        match &result {
            Ok(quantity) => debug!(product_id = %id, quantity, "Incremented cart item"),
            Err(e) => warn!(product_id = %id, error = %e, "Ignoring increment"),
        }
        result
    }

    /// Decrease a product's quantity by one, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownId` if the product is not in the cart. The
    /// cart is left unchanged and nothing is written.
    pub fn decrement(&self, id: &str) -> Result<DecrementOutcome> {
        let result = self.mutate(|cart| cart.decrement(id));
        match &result {
            Ok(outcome) => debug!(product_id = %id, ?outcome, "Decremented cart item"),
            Err(e) => warn!(product_id = %id, error = %e, "Ignoring decrement"),
        }
        result
    }

    /// Wait for queued writes to be attempted.
    ///
    /// # Errors
    ///
    /// Returns the storage error of the most recent write attempt, or
    /// `CartError::WriterClosed` if the writer is gone.
    pub async fn flush(&self) -> Result<()> {
        self.inner.writer.flush().await
    }

    /// Apply `op` to the cart; on success bump the revision, queue a write of
    /// the updated entries (once hydrated) and notify subscribers.
    fn mutate<T, E>(
        &self,
        op: impl FnOnce(&mut Cart) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let mut state = self.lock_state();
        let outcome = op(&mut state.cart)?;

        state.revision += 1;
        if state.hydrated {
            self.inner.writer.schedule(state.cart.items());
        }
        self.inner.changes.send_replace(state.cart.items().to_vec());
        Ok(outcome)
    }

    // `Cart` operations never panic midway, so a poisoned lock still holds a
    // consistent cart
    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.storage_key)
            .field("status", &self.status())
            .field("items", &self.len())
            .finish_non_exhaustive()
    }
}

/// Receives a notification whenever the cart changes.
pub struct CartSubscriber {
    rx: watch::Receiver<Vec<CartItem>>,
}

impl CartSubscriber {
    /// Wait for the next change.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Closed` once every `CartStore` handle is dropped.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx.changed().await.map_err(|_| CartError::Closed)
    }

    /// Snapshot of the cart entries as of the latest change.
    #[must_use]
    pub fn products(&mut self) -> Vec<CartItem> {
        self.rx.borrow_and_update().clone()
    }
}
