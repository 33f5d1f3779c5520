//! Counter store seam.
//!
//! The synchronizer only needs four primitives from the shared store. `increment`
//! must be atomic on the store side: it is the only thing that keeps concurrent
//! votes from different requests and different replicas from being lost.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store command failed: {0}")]
    Command(#[from] redis::RedisError),
    #[error("Store operation {0} timed out")]
    Timeout(&'static str),
    #[error("Connection pool closed")]
    PoolClosed,
    #[error("Unexpected liveness reply: {0}")]
    UnexpectedPing(String),
    #[error("Store unavailable")]
    Unavailable,
}

#[rocket::async_trait]
pub trait CounterStore: Send + Sync {
    /// Liveness probe, returns the raw reply.
    async fn ping(&self) -> Result<String, StoreError>;

    /// Current value of `key`. A key that was never written reads as 0.
    async fn get(&self, key: &str) -> Result<i64, StoreError>;

    /// Atomically adds one to `key` (creating it at 0) and returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError>;
}

/// In-process store with the same semantics as the shared one.
///
/// Only consistent within a single replica. Used for local runs (`memory://`)
/// and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, i64>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable every operation fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Raw view of a counter; `None` when the key was never written.
    pub fn peek(&self, key: &str) -> Option<i64> {
        self.counters().get(key).copied()
    }

    fn counters(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[rocket::async_trait]
impl CounterStore for MemoryStore {
    async fn ping(&self) -> Result<String, StoreError> {
        self.check()?;
        Ok("PONG".into())
    }

    async fn get(&self, key: &str) -> Result<i64, StoreError> {
        self.check()?;
        Ok(self.counters().get(key).copied().unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.check()?;
        let mut counters = self.counters();
        let counter = counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.check()?;
        self.counters().insert(key.to_string(), value);
        Ok(())
    }
}
