use anyhow::Context;
use tokio::net::TcpListener;

use labscan::{
    config::Config,
    handlers::{create_router, AppState},
    middleware::init_tracing,
    services::build_model,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    // Missing credentials stop the process here, before anything is bound.
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting medical lab analysis service");
    tracing::info!("LLM provider: {} ({})", config.provider, config.model);
    tracing::info!("Max prompt size: {} characters", config.max_prompt_chars);
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);

    let model = build_model(&config).context("Failed to initialize LLM client")?;

    let addr = config.bind_address();
    let state = AppState::new(config, model);
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
