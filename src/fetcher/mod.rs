pub mod ner_client;
pub mod page_fetcher;
pub mod strategies;
pub mod strategy_runner;

pub use ner_client::{EntityRecognizer, HuggingFaceNerClient, NerEntity, NerError};
pub use page_fetcher::{FetchError, PageFetcher, PageRequest, WreqPageFetcher};
pub use strategies::{ScrapeStrategy, default_strategies};
pub use strategy_runner::{ScrapeOutcome, ScrapeStrategyRunner, StrategyAttemptResult};
