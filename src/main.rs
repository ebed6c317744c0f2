//! GovAssist server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use govassist::adapters::ai::{GatewayConfig, GatewayProvider};
use govassist::adapters::extraction::{ExtractionConfig, HttpDocumentExtractor};
use govassist::adapters::http::{app_router, AppState};
use govassist::adapters::postgres::PostgresSessionStore;
use govassist::application::{ConversationOrchestrator, EngineSettings};
use govassist::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let store = Arc::new(PostgresSessionStore::new(pool));

    let mut gateway_config = GatewayConfig::new(config.completion.endpoint.clone())
        .with_timeout(config.completion.timeout());
    if let Some(api_key) = &config.completion.api_key {
        gateway_config = gateway_config.with_api_key(api_key.clone());
    }
    let completion = Arc::new(GatewayProvider::new(gateway_config)?);

    let mut extraction_config = ExtractionConfig::new(config.extraction.endpoint.clone())
        .with_timeout(config.extraction.timeout());
    if let Some(api_key) = &config.extraction.api_key {
        extraction_config = extraction_config.with_api_key(api_key.clone());
    }
    let extractor = Arc::new(HttpDocumentExtractor::new(extraction_config)?);

    let orchestrator = Arc::new(ConversationOrchestrator::new(
        store,
        extractor,
        completion,
        EngineSettings {
            timeout_minutes: config.engine.timeout_minutes,
            fee_per_year: config.engine.fee_per_year,
            reply_max_tokens: config.engine.reply_max_tokens,
            reply_temperature: config.engine.reply_temperature,
            reply_top_p: config.engine.reply_top_p,
        },
    ));

    let router = app_router(
        AppState { orchestrator },
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr();
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
