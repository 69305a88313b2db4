//! Per-customer lock registry.
//!
//! Accrual generation and carry-forward for the same customer must not
//! interleave: both run check-then-create sequences against the same period
//! and accrual rows. Every ledger write path acquires the customer's lock
//! before opening its transaction.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-customer async mutexes.
#[derive(Debug, Default)]
pub struct CustomerLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl CustomerLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a customer, creating it on first use.
    ///
    /// The guard is owned so it can be held across await points for the
    /// duration of a transaction.
    pub async fn acquire(&self, customer_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(customer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
