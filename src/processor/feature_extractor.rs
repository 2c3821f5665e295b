use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::fetcher::ner_client::{EntityRecognizer, NerEntity};
use crate::models::{
    Entities, ExtractedFeatures, FALLBACK_CONFIDENCE, Intent, ML_CONFIDENCE, PriceRange,
};

const MAX_KEYWORDS: usize = 5;

/// Ordered keyword → category table. Earlier rows win.
const CATEGORY_KEYWORDS: [(&[&str], &str); 6] = [
    (&["smartphone", "phone", "mobile"], "smartphone"),
    (&["laptop", "notebook"], "laptop"),
    (&["tablet", "ipad"], "tablet"),
    (&["headphone", "earphone", "earbuds"], "headphones"),
    (&["watch", "smartwatch"], "watch"),
    (&["camera", "dslr"], "camera"),
];

/// Known brands, in match priority order.
pub const BRAND_VOCABULARY: [&str; 30] = [
    "samsung", "apple", "iphone", "oneplus", "xiaomi", "redmi", "oppo", "vivo", "realme",
    "nokia", "motorola", "huawei", "honor", "google", "pixel", "poco", "iqoo", "nothing",
    "sony", "lg", "dell", "hp", "lenovo", "asus", "acer", "boat", "jbl", "bose", "canon",
    "nikon",
];

const STOP_WORDS: [&str; 48] = [
    "the", "and", "for", "with", "show", "find", "get", "want", "need", "looking", "look",
    "search", "under", "below", "less", "than", "within", "budget", "between", "best", "good",
    "some", "any", "please", "can", "you", "your", "what", "which", "that", "this", "are",
    "was", "buy", "give", "list", "price", "rupees", "from", "about", "like", "compare",
    "recommend", "suggest", "help", "me", "options", "products",
];

/// Category for a single lower-cased token: the longest category keyword it
/// contains decides, so "headphones" is headphones even though it contains "phone".
// Not a first-match scan over the message: that would read "headphones" as smartphone.
fn token_category(token: &str) -> Option<(usize, &'static str)> {
    CATEGORY_KEYWORDS
        .iter()
        .enumerate()
        .flat_map(|(rank, (keywords, category))| {
            keywords
                .iter()
                .filter(move |keyword| token.contains(*keyword))
                .map(move |keyword| (keyword.len(), rank, *category))
        })
        .max_by_key(|(len, _, _)| *len)
        .map(|(_, rank, category)| (rank, category))
}

/// First category (in table order) mentioned anywhere in `text`.
pub fn detect_category(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    tokenize(&lower)
        .filter_map(token_category)
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, category)| category)
}

/// First brand of the vocabulary named by a word in `text`. A word names a
/// brand when it is the brand, its plural, or the brand glued to a model
/// number ("iphones", "oneplus12"), but not a longer word ("vivobook").
pub fn detect_brand(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = tokenize(&lower).collect();
    BRAND_VOCABULARY
        .iter()
        .find(|brand| tokens.iter().any(|token| names_brand(token, brand)))
        .copied()
}

fn names_brand(token: &str, brand: &str) -> bool {
    token.strip_prefix(brand).is_some_and(|rest| {
        rest == "s" || rest == "es" || rest.chars().all(|c| c.is_ascii_digit())
    })
}

fn tokenize(lower: &str) -> impl Iterator<Item = &str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
}

pub fn detect_intent(message: &str) -> Intent {
    let lower = message.to_lowercase();
    // Plain substring scan: "vs" also fires inside words such as "canvas".
    if lower.contains("compare") || lower.contains("vs") {
        Intent::CompareProducts
    } else if lower.contains("recommend") || lower.contains("suggest") {
        Intent::RecommendProducts
    } else {
        Intent::SearchProducts
    }
}

pub fn extract_keywords(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for raw in lower.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if token.chars().count() <= 2
            || STOP_WORDS.contains(&token)
            || token.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        if seen.insert(token.to_string()) {
            keywords.push(token.to_string());
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    keywords
}

/// Deterministic, regex-driven feature extraction.
pub struct PatternExtractor {
    max_price_patterns: Vec<Regex>,
    range_pattern: Regex,
}

impl PatternExtractor {
    pub fn new() -> Result<Self> {
        const CURRENCY: &str = r"(?:rs\.?\s*|₹\s*|inr\s*)?";
        const AMOUNT: &str = r"(\d[\d,]*(?:\.\d+)?)(?:\s*(k)\b)?";

        let max_price_patterns = vec![
            Regex::new(&format!(r"\bunder\s+{CURRENCY}{AMOUNT}"))?,
            Regex::new(&format!(r"\bbelow\s+{CURRENCY}{AMOUNT}"))?,
            Regex::new(&format!(r"\bless\s+than\s+{CURRENCY}{AMOUNT}"))?,
            Regex::new(&format!(r"{AMOUNT}\s*(?:rs\b|rupees\b|inr\b)"))?,
            Regex::new(&format!(r"₹\s*{AMOUNT}"))?,
            Regex::new(&format!(r"\bbudget\s+(?:of\s+|is\s+)?{CURRENCY}{AMOUNT}"))?,
            Regex::new(&format!(r"\bwithin\s+{CURRENCY}{AMOUNT}"))?,
        ];
        let range_pattern = Regex::new(&format!(
            r"{CURRENCY}{AMOUNT}\s*(?:to|-)\s*{CURRENCY}{AMOUNT}"
        ))?;

        Ok(Self {
            max_price_patterns,
            range_pattern,
        })
    }

    pub fn extract(&self, message: &str) -> ExtractedFeatures {
        let entities = Entities {
            category: detect_category(message).map(str::to_string),
            brand: detect_brand(message).map(str::to_string),
            price_range: self.extract_price_range(message),
            keywords: extract_keywords(message),
        };

        ExtractedFeatures {
            intent: detect_intent(message),
            entities,
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    /// "under N" style bounds set `max`; a later "N to M" range overrides them.
    pub fn extract_price_range(&self, message: &str) -> Option<PriceRange> {
        let lower = message.to_lowercase();
        let mut range: Option<PriceRange> = None;

        for pattern in &self.max_price_patterns {
            if let Some(captures) = pattern.captures(&lower) {
                let max = parse_amount(
                    captures.get(1).map(|m| m.as_str()),
                    captures.get(2).is_some(),
                );
                if max.is_some() {
                    range = Some(PriceRange { min: None, max });
                    break;
                }
            }
        }

        if let Some(captures) = self.range_pattern.captures(&lower) {
            let min = parse_amount(captures.get(1).map(|m| m.as_str()), captures.get(2).is_some());
            let max = parse_amount(captures.get(3).map(|m| m.as_str()), captures.get(4).is_some());
            if min.is_some() && max.is_some() {
                range = Some(PriceRange { min, max });
            }
        }

        range
    }
}

/// "30,000" → 30000, "45k" → 45000, "1.5k" → 1500. Without `k` the
/// fraction is dropped ("16,999.00" → 16999).
fn parse_amount(digits: Option<&str>, thousands: bool) -> Option<u64> {
    let digits = digits?;
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let cleaned: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
    let value = cleaned.parse::<u64>().ok()?;
    if !thousands {
        return Some(value);
    }

    let millis: String = fraction.chars().chain("000".chars()).take(3).collect();
    let millis = millis.parse::<u64>().ok()?;
    value.checked_mul(1000)?.checked_add(millis)
}

/// Turns a raw user message into [`ExtractedFeatures`].
///
/// When an [`EntityRecognizer`] is configured it is consulted first and its
/// entities are merged into the pattern-based result. Any recognizer failure
/// silently routes to the pattern-only path; `extract` never fails.
pub struct TextFeatureExtractor {
    patterns: PatternExtractor,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl TextFeatureExtractor {
    pub fn new(recognizer: Option<Arc<dyn EntityRecognizer>>) -> Result<Self> {
        Ok(Self {
            patterns: PatternExtractor::new()?,
            recognizer,
        })
    }

    pub fn pattern_only() -> Result<Self> {
        Self::new(None)
    }

    pub async fn extract(&self, message: &str) -> ExtractedFeatures {
        let mut features = self.patterns.extract(message);

        let Some(recognizer) = &self.recognizer else {
            debug!("No NER service configured, using pattern extraction");
            return features;
        };

        if message.trim().is_empty() {
            return features;
        }

        match recognizer.infer(message).await {
            Ok(entities) => {
                info!("NER service returned {} entities", entities.len());
                merge_ner_entities(&mut features.entities, &entities);
                features.confidence = ML_CONFIDENCE;
            }
            Err(e) => {
                warn!("NER service unavailable, falling back to pattern extraction: {}", e);
            }
        }

        features
    }
}

fn merge_ner_entities(entities: &mut Entities, ner_entities: &[NerEntity]) {
    for entity in ner_entities {
        let word = entity.normalized_word();
        if word.is_empty() {
            continue;
        }

        if entities.brand.is_none() {
            if let Some(brand) = detect_brand(&word) {
                debug!("NER supplied brand '{}' ({})", brand, entity.entity_group);
                entities.brand = Some(brand.to_string());
            }
        }

        if entities.category.is_none() {
            if let Some(category) = detect_category(&word) {
                entities.category = Some(category.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::ner_client::NerError;
    use async_trait::async_trait;

    struct FixedRecognizer(Vec<NerEntity>);

    #[async_trait]
    impl EntityRecognizer for FixedRecognizer {
        async fn infer(&self, _text: &str) -> Result<Vec<NerEntity>, NerError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        async fn infer(&self, _text: &str) -> Result<Vec<NerEntity>, NerError> {
            Err(NerError::Status(503))
        }
    }

    fn extractor() -> PatternExtractor {
        PatternExtractor::new().unwrap()
    }

    #[test]
    fn test_samsung_phones_under_budget() {
        let features = extractor().extract("Show me samsung phones under 30000");

        assert_eq!(features.intent, Intent::SearchProducts);
        assert_eq!(features.entities.category.as_deref(), Some("smartphone"));
        assert_eq!(features.entities.brand.as_deref(), Some("samsung"));
        assert_eq!(
            features.entities.price_range,
            Some(PriceRange { min: None, max: Some(30000) })
        );
        assert_eq!(features.entities.keywords, vec!["samsung", "phones"]);
        assert_eq!(features.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_intent_detection() {
        assert_eq!(detect_intent("Compare iPhone 15 and Galaxy S24"), Intent::CompareProducts);
        assert_eq!(detect_intent("pixel 8 VS iphone 15"), Intent::CompareProducts);
        assert_eq!(detect_intent("Suggest a good laptop"), Intent::RecommendProducts);
        assert_eq!(detect_intent("recommend earbuds, compare later"), Intent::CompareProducts);
        assert_eq!(detect_intent("cheap tablets"), Intent::SearchProducts);
    }

    #[test]
    fn test_plain_message_has_no_entities() {
        let features = extractor().extract("something nice for my desk");

        assert_eq!(features.intent, Intent::SearchProducts);
        assert!(features.entities.category.is_none());
        assert!(features.entities.brand.is_none());
        assert!(features.entities.price_range.is_none());
        assert_eq!(features.entities.keywords, vec!["something", "nice", "desk"]);
        assert_eq!(features.confidence, 0.7);
    }

    #[test]
    fn test_empty_message() {
        let features = extractor().extract("");

        assert_eq!(features.intent, Intent::SearchProducts);
        assert_eq!(features.entities, Entities::default());
    }

    #[test]
    fn test_category_mapping_order_and_specificity() {
        assert_eq!(detect_category("wireless headphones"), Some("headphones"));
        assert_eq!(detect_category("new iPhone"), Some("smartphone"));
        assert_eq!(detect_category("gaming notebook"), Some("laptop"));
        assert_eq!(detect_category("smartwatch with gps"), Some("watch"));
        assert_eq!(detect_category("DSLR lens"), Some("camera"));
        // Both mentioned: the earlier table row wins.
        assert_eq!(detect_category("laptop or phone"), Some("smartphone"));
        assert_eq!(detect_category("a gift"), None);
    }

    #[test]
    fn test_brand_vocabulary_priority() {
        assert_eq!(detect_brand("apple or samsung?"), Some("samsung"));
        assert_eq!(detect_brand("compare iPhone 15 and Galaxy S24"), Some("iphone"));
        assert_eq!(detect_brand("asus vivobook"), Some("asus"));
        assert_eq!(detect_brand("no brand here"), None);
    }

    #[test]
    fn test_brand_plurals_and_model_numbers() {
        assert_eq!(detect_brand("Show me iphones under 50000"), Some("iphone"));
        assert_eq!(detect_brand("samsungs below 20000"), Some("samsung"));
        assert_eq!(detect_brand("oneplus12 or pixel8"), Some("oneplus"));
        assert_eq!(detect_brand("iphone15 pro"), Some("iphone"));

        assert_eq!(detect_brand("bulge in the php docs"), None);
        assert_eq!(detect_brand("honorable mentions"), None);

        let features = extractor().extract("Show me iphones under 50000");
        assert_eq!(features.entities.brand.as_deref(), Some("iphone"));
        assert_eq!(features.entities.max_price(), Some(50000));
    }

    #[test]
    fn test_max_price_patterns() {
        let extractor = extractor();
        let max = |text: &str| extractor.extract_price_range(text).and_then(|r| r.max);

        assert_eq!(max("phone below 15000"), Some(15000));
        assert_eq!(max("less than 20,000 please"), Some(20000));
        assert_eq!(max("earbuds 2000 rs"), Some(2000));
        assert_eq!(max("watch ₹5000"), Some(5000));
        assert_eq!(max("budget of 45k for a laptop"), Some(45000));
        assert_eq!(max("within rs. 12000"), Some(12000));
        assert_eq!(max("iphone 15"), None);
        assert_eq!(max("earbuds under 1.5k"), Some(1500));
        assert_eq!(max("tablet under 2.25k"), Some(2250));
        assert_eq!(max("phone below ₹16,999.00"), Some(16999));
        assert_eq!(max("laptop under 60000."), Some(60000));

        let range = extractor.extract_price_range("under 30000").unwrap();
        assert!(range.min.is_none());
    }

    #[test]
    fn test_range_overrides_max_only_match() {
        let range = extractor()
            .extract_price_range("phones under 50000, ideally 20000 to 30000")
            .unwrap();
        assert_eq!(range, PriceRange { min: Some(20000), max: Some(30000) });

        let range = extractor().extract_price_range("laptops 40000-60000").unwrap();
        assert_eq!(range, PriceRange { min: Some(40000), max: Some(60000) });

        let range = extractor().extract_price_range("earbuds 1.5k to 2k").unwrap();
        assert_eq!(range, PriceRange { min: Some(1500), max: Some(2000) });
    }

    #[test]
    fn test_keyword_filtering() {
        let keywords = extract_keywords("Best best Samsung 5G phone with 8 GB ram 2024 camera battery display");

        assert!(keywords.len() <= 5);
        assert_eq!(keywords, vec!["samsung", "phone", "ram", "camera", "battery"]);

        let keywords = extract_keywords("compare iPhone 15 and Galaxy S24");
        assert_eq!(keywords, vec!["iphone", "galaxy", "s24"]);
    }

    #[tokio::test]
    async fn test_ner_success_raises_confidence_and_fills_brand() {
        let recognizer = FixedRecognizer(vec![NerEntity {
            entity_group: "ORG".to_string(),
            word: "OnePlus".to_string(),
            score: 0.98,
        }]);
        let extractor = TextFeatureExtractor::new(Some(Arc::new(recognizer))).unwrap();

        let features = extractor.extract("good one from 0nePlus maybe").await;
        assert_eq!(features.confidence, ML_CONFIDENCE);
        assert_eq!(features.entities.brand.as_deref(), Some("oneplus"));
    }

    #[tokio::test]
    async fn test_ner_failure_falls_back() {
        let extractor = TextFeatureExtractor::new(Some(Arc::new(FailingRecognizer))).unwrap();

        let features = extractor.extract("Show me samsung phones under 30000").await;
        assert_eq!(features.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(features.entities.brand.as_deref(), Some("samsung"));
    }

    #[tokio::test]
    async fn test_pattern_only_extractor() {
        let extractor = TextFeatureExtractor::pattern_only().unwrap();
        let features = extractor.extract("recommend headphones").await;

        assert_eq!(features.intent, Intent::RecommendProducts);
        assert_eq!(features.entities.category.as_deref(), Some("headphones"));
        assert_eq!(features.confidence, FALLBACK_CONFIDENCE);
    }
}
