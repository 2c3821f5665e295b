pub mod app_config;
pub mod minio_config;
pub mod ner_config;
pub mod scraper_config;

pub use app_config::*;
pub use minio_config::*;
pub use ner_config::NerConfig;
pub use scraper_config::{DelayPolicy, DelayRange, MAX_RESULT_CAP, MIN_RESULT_CAP, ScrapingConfig};
