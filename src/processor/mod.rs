pub mod feature_extractor;
pub mod html_parser;
pub mod mock_synthesizer;
pub mod price_filter;
pub mod product_normalizer;
pub mod relevance;

pub use feature_extractor::{PatternExtractor, TextFeatureExtractor};
pub use html_parser::{HtmlProductParser, LayoutParser, ParseContext, SelectorLayout};
pub use mock_synthesizer::MockProductSynthesizer;
pub use price_filter::filter_by_price;
pub use product_normalizer::parse_price_digits;
pub use relevance::RelevanceScorer;
