use tally_backend::{build_rocket, config::Settings, connect_store, error::StartupError, init_state, rocket_figment};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

async fn run() -> Result<(), StartupError> {
    let settings = Settings::load(&Settings::config_path())?;
    info!("🚀 Starting vote server with choices {:?}", settings.choices);

    let store = connect_store(&settings).await?;
    let state = init_state(&settings, store).await?;
    info!("📋 Tally ready, page title {:?}", state.title);

    let figment = rocket_figment(&settings)?;
    build_rocket(figment, state, settings.debug)
        .launch()
        .await
        .map_err(Box::new)?;

    info!("Server shut down");
    Ok(())
}

#[rocket::main]
async fn main() -> Result<(), StartupError> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    run().await.inspect_err(|e| error!("✗ {}", e))
}
