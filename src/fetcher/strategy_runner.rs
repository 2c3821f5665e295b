use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{DelayPolicy, ScrapingConfig};
use crate::fetcher::page_fetcher::{FetchError, PageFetcher, detect_bot_marker};
use crate::fetcher::strategies::{ScrapeStrategy, default_strategies};
use crate::models::{Product, ScrapingParams};
use crate::processor::HtmlProductParser;

/// What one strategy produced.
#[derive(Debug, Clone)]
pub struct StrategyAttemptResult {
    pub strategy: &'static str,
    pub succeeded: bool,
    pub products: Vec<Product>,
    pub error: Option<FetchError>,
}

impl StrategyAttemptResult {
    fn success(strategy: &'static str, products: Vec<Product>) -> Self {
        Self {
            strategy,
            succeeded: true,
            products,
            error: None,
        }
    }

    fn failure(strategy: &'static str, error: FetchError) -> Self {
        Self {
            strategy,
            succeeded: false,
            products: Vec::new(),
            error: Some(error),
        }
    }
}

/// Result of a whole run: the winning strategy's products, or nothing plus
/// the last error for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub products: Vec<Product>,
    pub strategy: Option<&'static str>,
    pub last_error: Option<String>,
    pub attempts: usize,
}

/// Tries each strategy in turn, one at a time, until one yields products.
pub struct ScrapeStrategyRunner {
    strategies: Vec<Box<dyn ScrapeStrategy>>,
    fetcher: Arc<dyn PageFetcher>,
    parser: HtmlProductParser,
    config: ScrapingConfig,
    delays: DelayPolicy,
}

impl ScrapeStrategyRunner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapingConfig) -> Self {
        Self {
            strategies: default_strategies(),
            fetcher,
            parser: HtmlProductParser::new(&config),
            delays: config.delay_policy(),
            config,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ScrapeStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_delay_policy(mut self, delays: DelayPolicy) -> Self {
        self.delays = delays;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, keywords: &str, params: &ScrapingParams) -> ScrapeOutcome {
        let params = ScrapingParams {
            keywords: keywords.to_string(),
            ..params.clone()
        };
        let mut outcome = ScrapeOutcome::default();

        for (index, strategy) in self.strategies.iter().enumerate() {
            info!(
                "🔍 Strategy {}/{}: {} for '{}'",
                index + 1,
                self.strategies.len(),
                strategy.name(),
                keywords
            );

            let attempt = self.attempt(strategy.as_ref(), keywords, &params).await;
            outcome.attempts += 1;

            if attempt.succeeded {
                info!(
                    "✅ Strategy {} returned {} products",
                    attempt.strategy,
                    attempt.products.len()
                );
                outcome.products = attempt.products;
                outcome.strategy = Some(attempt.strategy);
                return outcome;
            }

            if let Some(error) = attempt.error {
                outcome.last_error = Some(format!("{}: {}", attempt.strategy, error));
            }

            if index + 1 < self.strategies.len() {
                let backoff = self.delays.backoff.sample();
                info!("Backing off {:?} before next strategy", backoff);
                sleep(backoff).await;
            }
        }

        warn!(
            "All {} scraping strategies failed, last error: {}",
            outcome.attempts,
            outcome.last_error.as_deref().unwrap_or("none")
        );
        outcome
    }

    async fn attempt(
        &self,
        strategy: &dyn ScrapeStrategy,
        keywords: &str,
        params: &ScrapingParams,
    ) -> StrategyAttemptResult {
        let name = strategy.name();

        let request = match strategy.build_request(params, &self.config) {
            Ok(request) => request,
            Err(e) => {
                warn!("Strategy {} could not build a request: {}", name, e);
                return StrategyAttemptResult::failure(name, e);
            }
        };

        sleep(self.delays.pre_request.sample()).await;

        let html = match tokio::time::timeout(request.timeout, self.fetcher.fetch(&request)).await
        {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                warn!("Strategy {} fetch failed: {}", name, e);
                return StrategyAttemptResult::failure(name, e);
            }
            Err(_) => {
                warn!("Strategy {} timed out after {:?}", name, request.timeout);
                return StrategyAttemptResult::failure(name, FetchError::Timeout(request.timeout));
            }
        };

        if let Some(marker) = detect_bot_marker(&html) {
            warn!("🤖 Bot detection on strategy {} (marker: '{}')", name, marker);
            return StrategyAttemptResult::failure(name, FetchError::BotDetected(marker));
        }

        let products = self.parser.parse(&html, keywords, params);
        if products.is_empty() {
            info!("Strategy {} returned a page without usable products", name);
            return StrategyAttemptResult::failure(name, FetchError::NoProducts);
        }

        StrategyAttemptResult::success(name, products)
    }
}
