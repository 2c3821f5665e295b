use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::Site;

/// Configuration for marketplace scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub amazon_base_url: String,
    pub flipkart_base_url: String,
    pub timeout_seconds: u64,
    pub max_products: usize,
    pub pre_request_delay_ms: DelayRange,
    pub backoff_delay_ms: DelayRange,
    pub desktop_user_agents: Vec<String>,
    pub mobile_user_agents: Vec<String>,
    pub accept_languages: Vec<String>,
}

/// Inclusive bounds of a randomized wait, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min: 0, max: 0 };

    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Pick a duration inside the range. Reversed bounds are tolerated.
    pub fn sample(&self) -> Duration {
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if low == high {
            return Duration::from_millis(low);
        }
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

/// Rate-shaping waits applied around every strategy attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub pre_request: DelayRange,
    pub backoff: DelayRange,
}

impl DelayPolicy {
    pub fn none() -> Self {
        Self {
            pre_request: DelayRange::ZERO,
            backoff: DelayRange::ZERO,
        }
    }
}

/// Bounds every configured result cap is clamped into.
pub const MIN_RESULT_CAP: usize = 15;
pub const MAX_RESULT_CAP: usize = 20;

impl ScrapingConfig {
    pub fn base_url(&self, site: Site) -> &str {
        match site {
            Site::Amazon => &self.amazon_base_url,
            Site::Flipkart => &self.flipkart_base_url,
        }
    }

    /// `max_products` clamped into `MIN_RESULT_CAP..=MAX_RESULT_CAP`.
    pub fn result_cap(&self) -> usize {
        self.max_products.clamp(MIN_RESULT_CAP, MAX_RESULT_CAP)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        DelayPolicy {
            pre_request: self.pre_request_delay_ms,
            backoff: self.backoff_delay_ms,
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            amazon_base_url: "https://www.amazon.in".to_string(),
            flipkart_base_url: "https://www.flipkart.com".to_string(),
            timeout_seconds: 12,
            max_products: 20,
            pre_request_delay_ms: DelayRange::new(500, 2000),
            backoff_delay_ms: DelayRange::new(2000, 5000),
            desktop_user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0".to_string(),
            ],
            mobile_user_agents: vec![
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1".to_string(),
                "Mozilla/5.0 (Linux; Android 14; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36".to_string(),
                "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Mobile Safari/537.36".to_string(),
            ],
            accept_languages: vec![
                "en-IN,en;q=0.9".to_string(),
                "en-US,en;q=0.9,hi;q=0.8".to_string(),
                "en-GB,en;q=0.8".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = ScrapingConfig::default();
        assert_eq!(config.timeout_seconds, 12);
        assert_eq!(config.max_products, 20);
        assert!(!config.desktop_user_agents.is_empty());
        assert!(!config.mobile_user_agents.is_empty());
        assert_eq!(config.base_url(Site::Flipkart), "https://www.flipkart.com");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ScrapingConfig = toml::from_str(
            r#"
            timeout_seconds = 5
            pre_request_delay_ms = { min = 0, max = 0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.pre_request_delay_ms, DelayRange::ZERO);
        assert_eq!(config.backoff_delay_ms, DelayRange::new(2000, 5000));
        assert_eq!(config.amazon_base_url, "https://www.amazon.in");
    }

    #[test]
    fn test_result_cap_is_clamped() {
        let mut config = ScrapingConfig::default();
        assert_eq!(config.result_cap(), 20);

        config.max_products = 0;
        assert_eq!(config.result_cap(), MIN_RESULT_CAP);

        config.max_products = 100;
        assert_eq!(config.result_cap(), MAX_RESULT_CAP);

        config.max_products = 17;
        assert_eq!(config.result_cap(), 17);
    }

    #[test]
    fn test_delay_sampling_stays_in_range() {
        let range = DelayRange::new(10, 20);
        for _ in 0..50 {
            let sampled = range.sample().as_millis() as u64;
            assert!((10..=20).contains(&sampled));
        }

        assert!(DelayRange::new(30, 10).sample() >= Duration::from_millis(10));
        assert_eq!(DelayPolicy::none().backoff.sample(), Duration::ZERO);
    }
}
