//! # Vote tally server
//!
//! A one-page ballot with a fixed set of choices and a running count.
//!
//! ## Replicas
//!
//! Counts live in Redis, one integer key per choice, so any number of server
//! replicas can share a tally. Each replica only keeps a cache of the counts,
//! refreshed from Redis on every page view; votes are a single atomic `INCR`.
//!
//! ## Startup
//!
//! 1. Read `config.toml` (or the file named by `VOTES_CONFIG`)
//! 2. Open the Redis pool and `PING` it
//! 3. Load the current count of every choice
//! 4. Serve
//!
//! Failing any of these stops the process. After startup, store failures are
//! logged and counted (`/api/stats`) but never fail a request.

pub mod catchers;
pub mod config;
pub mod error;
pub mod fairing;
pub mod redis_store;
pub mod routes;
pub mod store;
pub mod tally;
pub mod utils;
pub mod views;

use std::sync::Arc;

use rocket::{Build, Rocket, catchers, figment::Figment, routes};
use tracing::info;

use config::Settings;
use error::StartupError;
use fairing::RequestTrace;
use redis_store::RedisStore;
use routes::AppState;
use store::{CounterStore, MemoryStore};
use tally::TallySynchronizer;

/// Connects the configured counter store.
pub async fn connect_store(settings: &Settings) -> Result<Arc<dyn CounterStore>, StartupError> {
    if settings.uses_memory_store() {
        info!("Using in-process counter store, counts are not shared between replicas");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = RedisStore::connect(&settings.store_settings()).await?;
    Ok(Arc::new(store))
}

/// Builds the application state: registry, store connection and initial tally.
pub async fn init_state(
    settings: &Settings,
    store: Arc<dyn CounterStore>,
) -> Result<AppState, StartupError> {
    let registry = Arc::new(settings.registry()?);
    let tally = TallySynchronizer::initialize(registry, store, settings.key_prefix.clone()).await?;

    Ok(AppState::new(settings.resolved_title(), tally))
}

/// Rocket's own settings derived from ours.
pub fn rocket_figment(settings: &Settings) -> Result<Figment, StartupError> {
    let log_level = if settings.debug { "normal" } else { "critical" };

    Ok(rocket::Config::figment()
        .merge(("address", settings.address()?))
        .merge(("port", settings.port()?))
        .merge(("log_level", log_level)))
}

pub fn build_rocket(figment: Figment, state: AppState, debug: bool) -> Rocket<Build> {
    let rocket = rocket::custom(figment)
        .manage(state)
        .mount("/", routes![routes::index, routes::submit_form])
        .mount(
            "/api",
            routes![
                routes::health,
                routes::get_tally,
                routes::cast_vote,
                routes::get_stats
            ],
        )
        .register(
            "/",
            catchers![
                catchers::bad_request,
                catchers::not_found,
                catchers::unprocessable,
                catchers::internal_error
            ],
        );

    if debug {
        rocket.attach(RequestTrace)
    } else {
        rocket
    }
}
