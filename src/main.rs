use anyhow::{Context, Result};
use product_discovery::config::{AppConfig, DEFAULT_CONFIG_PATH};
use product_discovery::pipeline::{ChatEvent, ChatTurnOrchestrator};
use product_discovery::server;
use std::env;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    info!(
        "Loaded configuration: storage={:?}, ner={}, bind={}",
        config.storage.backend,
        if config.ner.credentials().is_some() { "enabled" } else { "pattern-only" },
        config.server.bind_address
    );

    let orchestrator = ChatTurnOrchestrator::from_config(&config)
        .await
        .context("Failed to initialize chat pipeline")?;

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ChatEvent::ChatCreated { chat_id, user_id, title } = event {
                info!("💬 New chat {} for {}: {}", chat_id, user_id, title);
            }
        }
    });

    server::serve(&config.server.bind_address, Arc::new(orchestrator)).await
}
