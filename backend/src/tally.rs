//! # Tally synchronization
//!
//! The store holds the authoritative counters, shared by every replica. Each
//! process keeps a local cache of them that is only good for the response being
//! rendered: any other replica may have changed the counters since.
//!
//! - Page views refresh every choice from the store before rendering
//! - A vote is a single atomic `INCR`, no local locking involved
//! - A reset writes 0 to each counter in registry order; a concurrent reader
//!   can observe some counters reset and others not yet
//! - After startup, store failures are logged and counted, and the cached value
//!   for that choice is kept as is
//!
//! The cache itself sits behind a mutex that is never held across an `.await`,
//! so a refresh lands as a whole.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tally_shared::{ChoiceRegistry, SyncStats, Tally};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::store::{CounterStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("Failed to load initial count for {choice}: {source}")]
    Initialize {
        choice: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug)]
struct Counters {
    store_failures: AtomicU64,
    votes_accepted: AtomicU64,
    votes_rejected: AtomicU64,
    resets: AtomicU64,
    started_at: OffsetDateTime,
    last_reset_at: Mutex<Option<OffsetDateTime>>,
}

impl Counters {
    fn new() -> Self {
        Self {
            store_failures: AtomicU64::new(0),
            votes_accepted: AtomicU64::new(0),
            votes_rejected: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            started_at: OffsetDateTime::now_utc(),
            last_reset_at: Mutex::new(None),
        }
    }
}

pub struct TallySynchronizer {
    registry: Arc<ChoiceRegistry>,
    store: Arc<dyn CounterStore>,
    key_prefix: String,
    cache: Mutex<HashMap<String, i64>>,
    counters: Counters,
}

impl TallySynchronizer {
    /// Loads every choice's count from the store. Runs once, before serving;
    /// an unknown starting tally is fatal.
    pub async fn initialize(
        registry: Arc<ChoiceRegistry>,
        store: Arc<dyn CounterStore>,
        key_prefix: impl Into<String>,
    ) -> Result<Self, TallyError> {
        let key_prefix = key_prefix.into();
        let mut cache = HashMap::with_capacity(registry.len());

        for choice in registry.iter() {
            let key = format!("{key_prefix}{choice}");
            let count = store.get(&key).await.map_err(|source| TallyError::Initialize {
                choice: choice.to_string(),
                source,
            })?;
            cache.insert(choice.to_string(), count);
        }

        let synchronizer = Self {
            registry,
            store,
            key_prefix,
            cache: Mutex::new(cache),
            counters: Counters::new(),
        };
        info!("Loaded tally {:?}", synchronizer.snapshot().entries());

        Ok(synchronizer)
    }

    pub fn registry(&self) -> &ChoiceRegistry {
        &self.registry
    }

    /// Re-reads every choice from the store so votes recorded by other
    /// replicas become visible, and returns the refreshed tally.
    pub async fn refresh_all(&self) -> Tally {
        let reads = self.registry.iter().map(|choice| async move {
            (choice, self.store.get(&self.key_for(choice)).await)
        });
        let results = join_all(reads).await;

        let mut cache = self.cache();
        for (choice, result) in results {
            match result {
                Ok(count) => {
                    cache.insert(choice.to_string(), count);
                }
                Err(e) => self.store_failed("GET", choice, &e),
            }
        }

        self.tally_from(&cache)
    }

    /// Counts one vote for `name`. Returns false, without touching the store,
    /// when `name` is not a registered choice.
    pub async fn record_vote(&self, name: &str) -> bool {
        if !self.registry.contains(name) {
            self.counters.votes_rejected.fetch_add(1, Ordering::Relaxed);
            debug!("Ignoring vote for unknown choice {:?}", name);
            return false;
        }

        self.counters.votes_accepted.fetch_add(1, Ordering::Relaxed);
        match self.store.increment(&self.key_for(name)).await {
            Ok(count) => {
                debug!("{}={}", name, count);
                self.cache().insert(name.to_string(), count);
            }
            Err(e) => self.store_failed("INCR", name, &e),
        }

        true
    }

    /// Writes 0 to every counter in registry order and returns the resulting
    /// tally. The store writes are not atomic across choices; the cache is
    /// zeroed in one step once they finish.
    pub async fn reset_all(&self) -> Tally {
        let mut zeroed = Vec::with_capacity(self.registry.len());
        for choice in self.registry.iter() {
            match self.store.set(&self.key_for(choice), 0).await {
                Ok(()) => zeroed.push(choice),
                Err(e) => self.store_failed("SET", choice, &e),
            }
        }

        self.counters.resets.fetch_add(1, Ordering::Relaxed);
        *self
            .counters
            .last_reset_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(OffsetDateTime::now_utc());
        info!("Tally reset, {} of {} counters zeroed", zeroed.len(), self.registry.len());

        let mut cache = self.cache();
        for choice in zeroed {
            cache.insert(choice.to_string(), 0);
        }
        self.tally_from(&cache)
    }

    /// The cached tally, without consulting the store.
    pub fn snapshot(&self) -> Tally {
        self.tally_from(&self.cache())
    }

    pub fn stats(&self) -> SyncStats {
        let counters = &self.counters;
        SyncStats {
            store_failures: counters.store_failures.load(Ordering::Relaxed),
            votes_accepted: counters.votes_accepted.load(Ordering::Relaxed),
            votes_rejected: counters.votes_rejected.load(Ordering::Relaxed),
            resets: counters.resets.load(Ordering::Relaxed),
            started_at: counters.started_at,
            last_reset_at: *counters
                .last_reset_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn key_for(&self, choice: &str) -> String {
        format!("{}{}", self.key_prefix, choice)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tally_from(&self, cache: &HashMap<String, i64>) -> Tally {
        self.registry
            .iter()
            .map(|choice| (choice.to_string(), cache.get(choice).copied().unwrap_or(0)))
            .collect()
    }

    fn store_failed(&self, op: &str, choice: &str, error: &StoreError) {
        self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
        warn!("{} {} failed, keeping cached count: {}", op, choice, error);
    }
}
