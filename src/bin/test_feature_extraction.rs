use anyhow::Result;
use product_discovery::config::{AppConfig, DEFAULT_CONFIG_PATH};
use product_discovery::fetcher::{EntityRecognizer, HuggingFaceNerClient};
use product_discovery::processor::TextFeatureExtractor;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let mut messages: Vec<String> = env::args().skip(1).collect();
    if messages.is_empty() {
        messages = vec![
            "Show me samsung phones under 30000".to_string(),
            "compare iPhone 15 and Galaxy S24".to_string(),
            "recommend wireless headphones between 2000 to 5000".to_string(),
            "gaming laptop budget of 80k".to_string(),
            String::new(),
        ];
    }

    let config = AppConfig::load(DEFAULT_CONFIG_PATH)?;
    let recognizer = HuggingFaceNerClient::from_config(&config.ner)?
        .map(|client| Arc::new(client) as Arc<dyn EntityRecognizer>);

    println!("=== FEATURE EXTRACTION TEST ===");
    println!(
        "🔧 NER service: {}\n",
        if recognizer.is_some() { "configured" } else { "not configured (pattern only)" }
    );

    let extractor = TextFeatureExtractor::new(recognizer)?;

    for message in &messages {
        let features = extractor.extract(message).await;
        println!("📝 \"{}\"", message);
        println!("{}\n", serde_json::to_string_pretty(&features)?);
    }

    Ok(())
}
