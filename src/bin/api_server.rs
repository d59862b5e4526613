// API Server Binary Entry Point
//
// Purpose: Open (load or train) both recommenders, then serve the Axum router
// Usage: cargo run --bin api_server

use crop_advisor::{create_router, AppState, ServerConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "crop_advisor=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = ServerConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {:?}", config.data_dir);
    tracing::info!("  MODEL_DIR: {:?}", config.model_dir);
    tracing::info!("  STATIC_DIR: {:?}", config.static_dir);
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  ERROR_MODE: {:?}", config.error_mode);

    // Training can take a while on first start: keep it off the async workers
    tracing::info!("Initializing application state...");
    let state_config = config.clone();
    let state = tokio::task::spawn_blocking(move || AppState::new(&state_config)).await??;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
