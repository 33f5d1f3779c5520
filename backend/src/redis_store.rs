//! # Redis
//!
//! Shared counter store. One plain string key per choice holding an integer;
//! `INCR` gives the atomic increment every replica relies on.
//!
//! ## Pool
//!
//! - `pool_size` managed connections, opened eagerly at startup
//! - A semaphore with `pool_size` permits bounds in-flight commands, so callers
//!   queue for a free slot instead of failing
//! - Connections are handed out round-robin
//! - Every command runs under the configured timeout

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use redis::{
    AsyncCommands, Client, RedisResult,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::{sync::Semaphore, time::timeout};
use tracing::{debug, info};

use crate::store::{CounterStore, StoreError};

const PING_REPLY: &str = "PONG";

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub url: String,
    pub pool_size: usize,
    pub op_timeout: Duration,
}

pub struct RedisStore {
    connections: Vec<ConnectionManager>,
    permits: Semaphore,
    next: AtomicUsize,
    op_timeout: Duration,
}

impl RedisStore {
    /// Opens the pool and probes it. Any failure here means the process
    /// cannot start.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let client = Client::open(settings.url.as_str())?;
        let pool_size = settings.pool_size.max(1);

        let mut connections = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let config = ConnectionManagerConfig::new().set_number_of_retries(1);
            let manager = timeout(
                settings.op_timeout,
                client.get_connection_manager_with_config(config),
            )
            .await
            .map_err(|_| StoreError::Timeout("connect"))??;
            connections.push(manager);
        }

        let store = Self {
            connections,
            permits: Semaphore::new(pool_size),
            next: AtomicUsize::new(0),
            op_timeout: settings.op_timeout,
        };

        let reply = store.ping().await?;
        if reply != PING_REPLY {
            return Err(StoreError::UnexpectedPing(reply));
        }
        info!("Counter store reachable ({}), {} pooled connections", reply, pool_size);

        Ok(store)
    }

    async fn with_connection<T, F, Fut>(&self, op: &'static str, command: F) -> Result<T, StoreError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let _permit = self.permits.acquire().await.map_err(|_| StoreError::PoolClosed)?;
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let connection = self.connections[index].clone();

        match timeout(self.op_timeout, command(connection)).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(op)),
        }
    }
}

#[rocket::async_trait]
impl CounterStore for RedisStore {
    async fn ping(&self) -> Result<String, StoreError> {
        self.with_connection("PING", |mut conn| async move {
            redis::cmd("PING").query_async(&mut conn).await
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<i64, StoreError> {
        let key = key.to_string();
        let value: Option<i64> = self
            .with_connection("GET", |mut conn| async move { conn.get(key).await })
            .await?;
        Ok(value.unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let key = key.to_string();
        let value: i64 = self
            .with_connection("INCR", |mut conn| async move { conn.incr(key, 1).await })
            .await?;
        debug!(value, "INCR");
        Ok(value)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_connection("SET", |mut conn| async move {
            conn.set::<_, _, ()>(key, value).await
        })
        .await
    }
}
