use anyhow::Result;
use common::database::{DatabaseConfig, health_check, init_pool};
use tokio::net::TcpListener;
use tracing::{info, warn};

use proxy::{
    AppState, config::ProxyConfig, create_router, repositories::HistoryRepository, storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init_tracing()?;

    info!("Starting FrameLab proxy");

    let config = ProxyConfig::load()?;
    if config.engine.api_key.is_empty() {
        warn!("FRAMELAB_ENGINE__API_KEY is not set; video routes will fail");
    }
    if config.speech.api_key.is_empty() {
        warn!("FRAMELAB_SPEECH__API_KEY is not set; text-to-speech will fail");
    }

    let storage = storage::from_config(&config.storage).await;
    info!(
        "Storing videos in {:?} bucket {}",
        config.storage.backend, config.storage.bucket
    );

    let history = if config.history.enabled {
        let db_config = DatabaseConfig::from_env()?;
        let pool = init_pool(&db_config).await?;

        if health_check(&pool).await? {
            info!("Database connection successful");
        } else {
            anyhow::bail!("Failed to connect to database");
        }

        let repository = HistoryRepository::new(pool);
        repository.ensure_schema().await?;
        Some(repository)
    } else {
        info!("Generation history disabled");
        None
    };

    let app_state = AppState::new(&config, storage, history)?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    info!("Proxy listening on {}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down proxy");
}
