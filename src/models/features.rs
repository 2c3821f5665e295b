use serde::{Deserialize, Serialize};

/// Confidence reported when the NER service contributed to the extraction.
pub const ML_CONFIDENCE: f64 = 0.85;
/// Confidence reported by the pattern-only extraction.
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    SearchProducts,
    CompareProducts,
    RecommendProducts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Entities {
    pub fn min_price(&self) -> Option<u64> {
        self.price_range.and_then(|range| range.min)
    }

    pub fn max_price(&self) -> Option<u64> {
        self.price_range.and_then(|range| range.max)
    }
}

/// Structured intent and entities extracted from a free-text shopping query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub intent: Intent,
    pub entities: Entities,
    pub confidence: f64,
}

impl Default for ExtractedFeatures {
    fn default() -> Self {
        Self {
            intent: Intent::default(),
            entities: Entities::default(),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}
