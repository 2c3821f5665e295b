//! Normalization helpers shared by the HTML parser and the mock synthesizer:
//! price parsing and formatting, title cleanup, and image URL repair.

use crate::processor::feature_extractor::detect_category;

/// Currency symbol used for every formatted price.
pub const CURRENCY_SYMBOL: &str = "₹";

const PLACEHOLDER_IMAGE_MARKERS: [&str; 6] = [
    "grey-pixel",
    "transparent-pixel",
    "loading",
    "placeholder",
    "spinner",
    "data:image",
];

/// Numeric value of a formatted price: every non-digit character is stripped.
pub fn parse_price_digits(price: &str) -> Option<u64> {
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Pull the first amount out of free price text ("₹24,999.00", "Rs. 1,299",
/// "24,999.") and re-format it. Fractional parts are dropped.
pub fn normalize_price(price_text: &str) -> Option<String> {
    let start = price_text.find(|c: char| c.is_ascii_digit())?;
    let amount: String = price_text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();

    let value = amount.parse::<u64>().ok()?;
    Some(format_price(value))
}

pub fn format_price(value: u64) -> String {
    format!("{}{}", CURRENCY_SYMBOL, group_digits(value))
}

/// Indian-locale digit grouping: the last three digits, then pairs.
/// `1234567` becomes `12,34,567`.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Collapse whitespace and decode entities that survive DOM text extraction
/// (double-encoded markup is common in marketplace titles).
pub fn clean_title(raw: &str) -> String {
    let decoded = raw
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make an image URL absolute. Placeholder and lazy-loading images come back
/// empty so the caller can substitute a stock image.
pub fn normalize_image_url(src: &str, base_url: &str) -> String {
    let src = src.trim();
    if src.is_empty() {
        return String::new();
    }

    let lower = src.to_lowercase();
    if PLACEHOLDER_IMAGE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return String::new();
    }

    if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        src.to_string()
    }
}

/// Absolute product link, built from the href when present.
pub fn normalize_link(href: Option<&str>, base_url: &str, fallback_path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match href.map(str::trim).filter(|href| !href.is_empty()) {
        Some(href) if href.starts_with("http://") || href.starts_with("https://") => {
            href.to_string()
        }
        Some(href) if href.starts_with("//") => format!("https:{}", href),
        Some(href) if href.starts_with('/') => format!("{}{}", base, href),
        Some(href) => format!("{}/{}", base, href),
        None => format!("{}{}", base, fallback_path),
    }
}

/// Stock image for a category name; falls back to a generic electronics shot.
pub fn stock_image(category: Option<&str>) -> &'static str {
    match category {
        Some("smartphone") => {
            "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400&h=400&fit=crop"
        }
        Some("laptop") => {
            "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400&h=400&fit=crop"
        }
        Some("tablet") => {
            "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=400&h=400&fit=crop"
        }
        Some("headphones") => {
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400&h=400&fit=crop"
        }
        Some("watch") => {
            "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=400&fit=crop"
        }
        Some("camera") => {
            "https://images.unsplash.com/photo-1516035069371-29a1b244cc32?w=400&h=400&fit=crop"
        }
        _ => "https://images.unsplash.com/photo-1498049794561-7780e7231661?w=400&h=400&fit=crop",
    }
}

/// Stock image chosen from an explicit category, or one inferred from the query.
pub fn stock_image_for_query(category: Option<&str>, keywords: &str) -> &'static str {
    match category {
        Some(category) => stock_image(Some(category)),
        None => stock_image(detect_category(keywords)),
    }
}
