use crate::models::{Entities, ExtractedFeatures, Intent};
use crate::processor::product_normalizer::format_price;

/// Assistant reply for a turn, from the extracted features and the number of
/// products being returned.
pub fn compose_response(features: &ExtractedFeatures, product_count: usize) -> String {
    match features.intent {
        Intent::CompareProducts => format!(
            "I found {} products for comparison. Here are the options to help you make the best choice:",
            product_count
        ),
        Intent::RecommendProducts => format!(
            "Based on your preferences, I recommend these {} products:",
            product_count
        ),
        Intent::SearchProducts if product_count == 0 => no_results(&features.entities),
        Intent::SearchProducts => format!(
            "I found {} product{}{}. Here are the best options:",
            product_count,
            if product_count == 1 { "" } else { "s" },
            constraints(&features.entities)
        ),
    }
}

fn no_results(entities: &Entities) -> String {
    format!(
        "Sorry, I couldn't find any products{}. Try adjusting your search, for example a wider budget or a different brand or category.",
        constraints(entities)
    )
}

/// " from Samsung in smartphone under ₹30,000" style suffix.
fn constraints(entities: &Entities) -> String {
    let mut suffix = String::new();

    if let Some(brand) = entities.brand.as_deref() {
        suffix.push_str(&format!(" from {}", capitalize(brand)));
    }
    if let Some(category) = entities.category.as_deref() {
        suffix.push_str(&format!(" in {}", category));
    }
    match (entities.min_price(), entities.max_price()) {
        (Some(min), Some(max)) => suffix.push_str(&format!(
            " between {} and {}",
            format_price(min),
            format_price(max)
        )),
        (None, Some(max)) => suffix.push_str(&format!(" under {}", format_price(max))),
        (Some(min), None) => suffix.push_str(&format!(" above {}", format_price(min))),
        (None, None) => {}
    }

    suffix
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
