use crate::models::ScrapingParams;

const BASE_SCORE: f64 = 0.5;
const KEYWORD_WEIGHT: f64 = 0.15;
const BRAND_WEIGHT: f64 = 0.25;

pub const REASON_KEYWORD: &str = "keyword_match";
pub const REASON_BRAND: &str = "brand_match";
pub const REASON_CATEGORY: &str = "category_match";
pub const REASON_AI: &str = "ai_recommended";

/// Query tokens long enough to count as keywords, lower-cased.
pub fn keyword_tokens(keywords: &str) -> Vec<String> {
    keywords
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > 2)
        .collect()
}

/// Heuristic relevance of a product title against the query.
pub struct RelevanceScorer;

impl RelevanceScorer {
    pub fn score(title: &str, keywords: &str, params: &ScrapingParams) -> (f64, Vec<String>) {
        let title_lower = title.to_lowercase();
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        for token in keyword_tokens(keywords) {
            if title_lower.contains(&token) {
                score += KEYWORD_WEIGHT;
            }
        }

        let full_query = keywords.trim().to_lowercase();
        if !full_query.is_empty() && title_lower.contains(&full_query) {
            reasons.push(REASON_KEYWORD.to_string());
        }

        if let Some(brand) = params.brand.as_deref().map(str::to_lowercase) {
            if !brand.is_empty() && title_lower.contains(&brand) {
                score += BRAND_WEIGHT;
                reasons.push(REASON_BRAND.to_string());
            }
        }

        if params.category.is_some() {
            reasons.push(REASON_CATEGORY.to_string());
        }

        reasons.push(REASON_AI.to_string());

        (score.clamp(0.0, 1.0), reasons)
    }
}
