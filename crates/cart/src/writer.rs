//! Background persistence writer.
//!
//! Each `CartStore` owns one writer task. Mutations hand it the freshly
//! serialized cart over an unbounded channel; the task writes payloads in the
//! order they were issued. Payloads that queue up while a write is in flight
//! are coalesced so only the newest one is written.

use std::sync::Arc;
use std::time::Duration;

use gomarket_core::CartItem;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::error::{CartError, Result, StorageError};
use crate::storage::KeyValueStore;

/// Bounded retry schedule for a single payload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`, saturating at `Duration::MAX`.
    pub backoff: Duration,
}

enum PersistRequest {
    Write(String),
    Flush(oneshot::Sender<std::result::Result<(), StorageError>>),
}

/// Handle used by the store to queue writes.
pub(crate) struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl PersistHandle {
    /// Spawn the writer task.
    ///
    /// Must be called from within a Tokio runtime. The task exits once the
    /// handle is dropped and the queue is drained.
    pub(crate) fn spawn(storage: Arc<dyn KeyValueStore>, key: String, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, storage, key, policy));
        Self { tx }
    }

    /// Serialize `items` and queue the payload.
    ///
    /// Never blocks and never fails the caller; problems are logged.
    pub(crate) fn schedule(&self, items: &[CartItem]) {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize cart, skipping write");
                return;
            }
        };

        if self.tx.send(PersistRequest::Write(payload)).is_err() {
            error!("Persistence writer has shut down, cart change not persisted");
        }
    }

    /// Wait until every previously queued payload has been attempted.
    ///
    /// # Errors
    ///
    /// Returns the storage error of the most recent write attempt, or
    /// `CartError::WriterClosed` if the task is gone.
    pub(crate) async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(PersistRequest::Flush(ack_tx))
            .map_err(|_| CartError::WriterClosed)?;

        ack_rx
            .await
            .map_err(|_| CartError::WriterClosed)?
            .map_err(CartError::from)
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    policy: RetryPolicy,
) {
    let mut last_outcome: std::result::Result<(), StorageError> = Ok(());

    while let Some(first) = rx.recv().await {
        let mut payload = None;
        let mut waiters = Vec::new();

        let mut next = Some(first);
        while let Some(request) = next {
            match request {
                PersistRequest::Write(body) => {
                    if payload.replace(body).is_some() {
                        debug!("Coalescing superseded cart write");
                    }
                }
                PersistRequest::Flush(ack) => waiters.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some(body) = payload {
            last_outcome = write_with_retry(storage.as_ref(), &key, &body, policy).await;
        }

        for ack in waiters {
            // Flush caller may have given up waiting
            let _ = ack.send(last_outcome.clone());
        }
    }

    debug!(key = %key, "Persistence writer stopped");
}

async fn write_with_retry(
    storage: &dyn KeyValueStore,
    key: &str,
    body: &str,
    policy: RetryPolicy,
) -> std::result::Result<(), StorageError> {
    let mut attempt: u32 = 0;
    loop {
        match storage.set(key, body).await {
            Ok(()) => {
                debug!(key = %key, bytes = body.len(), attempt, "Persisted cart");
                return Ok(());
            }
            Err(e) if attempt < policy.retries => {
                attempt += 1;
                warn!(key = %key, error = %e, attempt, "Cart write failed, retrying");
                tokio::time::sleep(retry_delay(policy.backoff, attempt)).await;
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to persist cart");
                return Err(e);
            }
        }
    }
}

const fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.saturating_mul(attempt)
}
