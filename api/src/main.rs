pub mod app;
pub mod config;
pub mod error;
pub mod features;
pub mod handler;
pub mod model;
pub mod schema;

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::app::AppState;
use crate::config::ServerConfig;
use crate::model::RandomForestModel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServerConfig::parse();
    config.log_config();

    // A missing or corrupt artifact stops the process before it serves anything.
    let model = RandomForestModel::load(&config.model_path)
        .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
    let state = AppState::new(model);

    let cors = config.cors_layer()?;
    let app = app::create_router(state, config.deployment, cors);
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    info!("Serving predictions on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, stopping server...");
}
