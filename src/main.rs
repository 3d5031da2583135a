use std::sync::Arc;
use tts_relay::controllers::gateway::GatewayController;
use tts_relay::domain::tts::TtsService;
use tts_relay::infrastructure::config::Config;
use tts_relay::infrastructure::gateway::ConnectionRegistry;
use tts_relay::infrastructure::http::{build_router, start_http_server};
use tts_relay::infrastructure::logging::init_logging;
use tts_relay::infrastructure::repositories::HttpTtsRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.log_format);

    tracing::info!(
        environment = ?config.environment,
        "Starting TTS relay gateway on {}:{}",
        config.host,
        config.port
    );

    if config.provider_api_key.is_none() {
        tracing::warn!("TTS_PROVIDER_API_KEY is not set; every synthesis request will be refused");
    }

    tracing::info!(
        provider_base_url = %config.provider_base_url,
        provider_model = %config.provider_model,
        timeout_secs = config.provider_timeout_secs,
        cache_enabled = config.tts_cache_enabled,
        "Synthesis provider configured"
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let tts_repo = Arc::new(HttpTtsRepository::new(
        config.provider_base_url.clone(),
        config.provider_api_key.clone(),
        config.provider_model.clone(),
        config.provider_timeout(),
    )?);

    // 2. Instantiate services (inject repositories)
    tracing::info!("Instantiating services...");
    let tts_service = Arc::new(TtsService::new(
        tts_repo,
        config.max_chunk_chars,
        config.tts_cache_enabled,
    ));

    // 3. Instantiate controllers (inject services and the connection registry)
    tracing::info!("Instantiating controllers...");
    let registry = Arc::new(ConnectionRegistry::new());
    let gateway_controller = Arc::new(GatewayController::new(tts_service, registry.clone()));

    // Start HTTP server with all routes
    let app = build_router(gateway_controller, registry.clone());
    start_http_server(config, app, registry).await?;

    Ok(())
}
