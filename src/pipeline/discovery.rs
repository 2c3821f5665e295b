use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{DelayPolicy, ScrapingConfig};
use crate::fetcher::{PageFetcher, ScrapeStrategyRunner};
use crate::models::{ScrapeResponse, ScrapeSource, ScrapingParams};
use crate::processor::{MockProductSynthesizer, filter_by_price};

/// The scraping subsystem: live strategies first, synthesized listings when
/// they produce nothing, one price filter over whichever set is returned.
pub struct ProductDiscovery {
    runner: ScrapeStrategyRunner,
    synthesizer: MockProductSynthesizer,
}

impl ProductDiscovery {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &ScrapingConfig) -> Self {
        Self {
            runner: ScrapeStrategyRunner::new(fetcher, config.clone()),
            synthesizer: MockProductSynthesizer::new(config),
        }
    }

    pub fn with_delay_policy(mut self, delays: DelayPolicy) -> Self {
        self.runner = self.runner.with_delay_policy(delays);
        self
    }

    pub async fn discover(&self, params: &ScrapingParams) -> ScrapeResponse {
        let keywords = params.keywords.trim();
        if keywords.is_empty() {
            return ScrapeResponse::error("Keywords are required", None);
        }

        info!(
            "Discovering products for '{}' on {} (category: {:?}, brand: {:?}, price: {:?}-{:?})",
            keywords,
            params.site.as_str(),
            params.category,
            params.brand,
            params.min_price,
            params.max_price
        );

        let outcome = self.runner.run(keywords, params).await;

        if !outcome.products.is_empty() {
            let scraped_count = outcome.products.len();
            let products = filter_by_price(outcome.products, params.min_price, params.max_price);

            if !products.is_empty() {
                info!(
                    "Returning {} scraped products ({} before price filter)",
                    products.len(),
                    scraped_count
                );
                return ScrapeResponse {
                    total_found: products.len(),
                    message: format!(
                        "Found {} products from live {} listings",
                        products.len(),
                        params.site.as_str()
                    ),
                    products,
                    source: ScrapeSource::Scraped,
                    scraping_attempted: true,
                    last_error: None,
                };
            }

            warn!(
                "All {} scraped products fell outside the requested price range",
                scraped_count
            );
        }

        let last_error = outcome
            .last_error
            .or_else(|| Some("Scraped products outside requested price range".to_string()));

        let synthesized = self.synthesizer.synthesize(keywords, params);
        let products = filter_by_price(synthesized, params.min_price, params.max_price);
        info!("Returning {} synthesized products", products.len());

        ScrapeResponse {
            total_found: products.len(),
            message: format!(
                "Live results unavailable, showing {} curated products",
                products.len()
            ),
            products,
            source: ScrapeSource::IntelligentMock,
            scraping_attempted: true,
            last_error,
        }
    }
}
