use serde::{Deserialize, Serialize};

/// A normalized product listing, either scraped from a marketplace or synthesized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: String,
    pub image: String,
    pub link: String,
    pub is_amazon_choice: bool,
    pub relevance_score: f64,
    pub match_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<String>,
}

impl Product {
    /// Numeric value of the formatted price, with currency symbols and separators removed.
    pub fn price_value(&self) -> Option<u64> {
        crate::processor::parse_price_digits(&self.price)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    #[default]
    Amazon,
    Flipkart,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Amazon => "amazon",
            Site::Flipkart => "flipkart",
        }
    }
}

/// Parameters of a single scrape attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapingParams {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub site: Site,
}

impl ScrapingParams {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Self::default()
        }
    }

    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

/// Where the products in a [`ScrapeResponse`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeSource {
    Scraped,
    IntelligentMock,
    Error,
}

/// Result of the scraping subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub products: Vec<Product>,
    pub source: ScrapeSource,
    pub message: String,
    pub total_found: usize,
    pub scraping_attempted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ScrapeResponse {
    pub fn error(message: impl Into<String>, last_error: Option<String>) -> Self {
        Self {
            products: Vec::new(),
            source: ScrapeSource::Error,
            message: message.into(),
            total_found: 0,
            scraping_attempted: false,
            last_error,
        }
    }
}
