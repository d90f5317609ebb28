pub mod api; // HTTP routes + server lifecycle
pub mod config;
pub mod core_state; // Shared state handed to every request
pub mod models;
pub mod pipeline;
pub mod store; // Latest-result store

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    State(#[from] core_state::CoreError),

    #[error("Cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Process entry point: tracing, configuration, state, then serve until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let bind_addr = config.bind_addr;

    // Blocking HTTP clients must be created and dropped outside the async runtime.
    let core = Arc::new(core_state::CoreState::from_config(config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(async {
        let server = api::start_api_server(Arc::clone(&core), bind_addr).await?;
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {e}");
        }
        server.stop().await;
        Ok::<(), StartupError>(())
    })?;

    drop(runtime);
    drop(core);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
