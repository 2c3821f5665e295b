use anyhow::Result;
use product_discovery::config::{AppConfig, DEFAULT_CONFIG_PATH};
use product_discovery::fetcher::WreqPageFetcher;
use product_discovery::models::{ScrapeSource, ScrapingParams, Site};
use product_discovery::pipeline::ProductDiscovery;
use product_discovery::processor::PatternExtractor;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let flipkart = args.iter().any(|arg| arg == "--flipkart");
    let query = args
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let query = if query.is_empty() {
        "samsung phones under 30000".to_string()
    } else {
        query
    };

    println!("=== SCRAPE TEST ===\n");
    println!("🔎 Query: {}", query);

    let config = AppConfig::load(DEFAULT_CONFIG_PATH)?;
    let features = PatternExtractor::new()?.extract(&query);
    let entities = features.entities;

    let params = ScrapingParams {
        keywords: if entities.keywords.is_empty() {
            query.clone()
        } else {
            entities.keywords.join(" ")
        },
        category: entities.category.clone(),
        min_price: entities.min_price(),
        max_price: entities.max_price(),
        brand: entities.brand.clone(),
        site: if flipkart { Site::Flipkart } else { Site::Amazon },
    };
    println!("   Params: {:?}\n", params);

    let discovery = ProductDiscovery::new(Arc::new(WreqPageFetcher::new()?), &config.scraping);
    let response = discovery.discover(&params).await;

    match response.source {
        ScrapeSource::Scraped => println!("✅ Live results: {}", response.message),
        ScrapeSource::IntelligentMock => println!("⚠️  Fallback results: {}", response.message),
        ScrapeSource::Error => println!("❌ {}", response.message),
    }
    if let Some(last_error) = &response.last_error {
        println!("   Last error: {}", last_error);
    }

    for (i, product) in response.products.iter().enumerate() {
        println!(
            "{:>2}. {} | {} | score {:.2} | {}",
            i + 1,
            product.title,
            product.price,
            product.relevance_score,
            product.match_reasons.join(",")
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
