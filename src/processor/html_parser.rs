use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::ScrapingConfig;
use crate::models::{Product, ScrapingParams, Site};
use crate::processor::product_normalizer::{
    clean_title, normalize_image_url, normalize_link, normalize_price, stock_image_for_query,
};
use crate::processor::relevance::{RelevanceScorer, keyword_tokens};

/// Title fragments that mark promotional or navigational blocks, not products.
const BOILERPLATE_MARKERS: [&str; 10] = [
    "sponsored",
    "advertisement",
    "deals of the day",
    "see more",
    "related searches",
    "frequently bought together",
    "customers who viewed",
    "see all results",
    "shop now",
    "need help",
];

/// A title is a product when it is not boilerplate and mentions the query.
/// A query without any usable token places no keyword constraint.
pub fn is_valid_product(title: &str, keywords: &str) -> bool {
    let title_lower = title.to_lowercase();

    if BOILERPLATE_MARKERS
        .iter()
        .any(|marker| title_lower.contains(marker))
    {
        return false;
    }

    let tokens = keyword_tokens(keywords);
    tokens.is_empty() || tokens.iter().any(|token| title_lower.contains(token.as_str()))
}

/// Everything a layout needs to turn containers into products.
pub struct ParseContext<'a> {
    pub keywords: &'a str,
    pub params: &'a ScrapingParams,
    pub base_url: &'a str,
    pub max_products: usize,
}

/// One known page layout of a marketplace search result page.
pub trait LayoutParser: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, document: &Html, ctx: &ParseContext) -> Vec<Product>;
}

/// A layout described entirely by CSS selectors, tried in order within each field.
#[derive(Debug, Clone)]
pub struct SelectorLayout {
    pub name: String,
    pub container: String,
    pub id_attribute: String,
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub image: Vec<String>,
    pub link: Vec<String>,
    pub rating: Vec<String>,
    pub review_count: Vec<String>,
    pub choice_markers: Vec<String>,
    /// Path used when no product link is found; `{id}` is replaced.
    pub fallback_link: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

const AMAZON_CHOICE_MARKERS: [&str; 4] =
    ["amazon's choice", "amazon’s choice", "amazons-choice", "ac-badge"];

impl SelectorLayout {
    pub fn amazon_standard_grid() -> Self {
        Self {
            name: "amazon_standard_grid".to_string(),
            container: r#"div[data-component-type="s-search-result"][data-asin]"#.to_string(),
            id_attribute: "data-asin".to_string(),
            title: strings(&["h2 a span", "h2 span", "h2"]),
            price: strings(&[
                ".a-price:not(.a-text-price) .a-offscreen",
                ".a-price .a-offscreen",
                ".a-price-whole",
            ]),
            image: strings(&["img.s-image"]),
            link: strings(&["h2 a", "a.a-link-normal.s-no-outline", "a.a-link-normal"]),
            rating: strings(&[".a-icon-alt"]),
            review_count: strings(&[
                "span.a-size-base.s-underline-text",
                r#"a[href*="customerReviews"] span"#,
            ]),
            choice_markers: strings(&AMAZON_CHOICE_MARKERS),
            fallback_link: "/dp/{id}".to_string(),
        }
    }

    pub fn amazon_alternate_grid() -> Self {
        Self {
            name: "amazon_alternate_grid".to_string(),
            container: "div.s-result-item[data-asin]".to_string(),
            id_attribute: "data-asin".to_string(),
            title: strings(&["span.a-text-normal", ".a-link-normal .a-text-normal", "h2"]),
            price: strings(&["span.a-price span.a-offscreen", "span.a-price-whole", "span.a-color-price"]),
            image: strings(&["img.s-image", "img"]),
            link: strings(&["a.a-link-normal", "a[href]"]),
            rating: strings(&[".a-icon-alt"]),
            review_count: strings(&["span.a-size-base.s-underline-text", "span.a-size-base"]),
            choice_markers: strings(&AMAZON_CHOICE_MARKERS),
            fallback_link: "/dp/{id}".to_string(),
        }
    }

    pub fn amazon_mobile() -> Self {
        Self {
            name: "amazon_mobile".to_string(),
            container: "div[data-asin], li[data-asin]".to_string(),
            id_attribute: "data-asin".to_string(),
            title: strings(&[
                "h2 span",
                "span.a-size-base.a-color-base.a-text-normal",
                "span.a-size-small.a-color-base.a-text-normal",
                ".a-text-normal",
            ]),
            price: strings(&[".a-price .a-offscreen", ".a-price-whole", "span.a-color-price"]),
            image: strings(&["img.s-image", "img"]),
            link: strings(&["a.a-link-normal", "a[href]"]),
            rating: strings(&[".a-icon-alt"]),
            review_count: strings(&["span.a-size-small.s-underline-text", "span.a-size-small"]),
            choice_markers: strings(&AMAZON_CHOICE_MARKERS),
            fallback_link: "/dp/{id}".to_string(),
        }
    }

    pub fn flipkart_grid() -> Self {
        Self {
            name: "flipkart_grid".to_string(),
            container: "div[data-id]".to_string(),
            id_attribute: "data-id".to_string(),
            title: strings(&["div.KzDlHZ", "div._4rR01T", "a.wjcEIp", "a.s1Q9rs", "a.IRpwTa", "a[title]"]),
            price: strings(&["div.Nx9bqj", "div._30jeq3"]),
            image: strings(&["img.DByuf4", "img._396cs4", "img"]),
            link: strings(&["a.CGtC98", "a._1fQZEK", "a[href]"]),
            rating: strings(&["div.XQDdHH", "div._3LWZlK"]),
            review_count: strings(&["span.Wphh3N", "span._2_R_DZ"]),
            choice_markers: strings(&["fk-assured", "flipkart assured"]),
            fallback_link: "/product/p/itm?pid={id}".to_string(),
        }
    }

    fn first_text(&self, element: ElementRef, selectors: &[String]) -> Option<String> {
        for selector_str in selectors {
            match Selector::parse(selector_str) {
                Ok(selector) => {
                    for found in element.select(&selector) {
                        let text = clean_title(&found.text().collect::<Vec<_>>().join(" "));
                        if !text.is_empty() {
                            return Some(text);
                        }
                    }
                }
                Err(_) => warn!("Invalid selector in layout {}: {}", self.name, selector_str),
            }
        }
        None
    }

    fn first_attr(
        &self,
        element: ElementRef,
        selectors: &[String],
        attributes: &[&str],
    ) -> Option<String> {
        for selector_str in selectors {
            let Ok(selector) = Selector::parse(selector_str) else {
                warn!("Invalid selector in layout {}: {}", self.name, selector_str);
                continue;
            };
            for found in element.select(&selector) {
                for attribute in attributes {
                    if let Some(value) = found.value().attr(attribute) {
                        if !value.trim().is_empty() {
                            return Some(value.trim().to_string());
                        }
                    }
                }
            }
        }
        None
    }

    fn extract_one(&self, element: ElementRef, id: &str, ctx: &ParseContext) -> Option<Product> {
        let title = self
            .first_text(element, &self.title)
            .filter(|title| title.chars().count() > 2)?;
        let price = self
            .first_text(element, &self.price)
            .and_then(|text| normalize_price(&text))?;

        if !is_valid_product(&title, ctx.keywords) {
            debug!("Rejected container {} with title '{}'", id, title);
            return None;
        }

        let image = self
            .first_attr(element, &self.image, &["src", "data-src", "data-old-hires"])
            .map(|src| normalize_image_url(&src, ctx.base_url))
            .filter(|src| !src.is_empty())
            .unwrap_or_else(|| {
                stock_image_for_query(ctx.params.category.as_deref(), ctx.keywords).to_string()
            });

        let href = self.first_attr(element, &self.link, &["href"]);
        let link = normalize_link(
            href.as_deref(),
            ctx.base_url,
            &self.fallback_link.replace("{id}", id),
        );

        let rating = self.first_text(element, &self.rating).and_then(|text| {
            text.split_whitespace()
                .find(|token| token.parse::<f64>().is_ok())
                .map(str::to_string)
        });

        // "(12,345)" or "1,23,456 Ratings & 5,432 Reviews": first grouped number
        let review_count = self.first_text(element, &self.review_count).and_then(|text| {
            let start = text.find(|c: char| c.is_ascii_digit())?;
            let count: String = text[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',')
                .collect();
            Some(count.trim_end_matches(',').to_string())
        });

        let container_html = element.html().to_lowercase();
        let is_amazon_choice = self
            .choice_markers
            .iter()
            .any(|marker| container_html.contains(marker.as_str()));

        let (relevance_score, match_reasons) =
            RelevanceScorer::score(&title, ctx.keywords, ctx.params);

        Some(Product {
            id: id.to_string(),
            title,
            price,
            image,
            link,
            is_amazon_choice,
            relevance_score,
            match_reasons,
            rating,
            review_count,
        })
    }
}

impl LayoutParser for SelectorLayout {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html, ctx: &ParseContext) -> Vec<Product> {
        let Ok(container) = Selector::parse(&self.container) else {
            warn!("Invalid container selector in layout {}: {}", self.name, self.container);
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut products = Vec::new();

        for element in document.select(&container) {
            if products.len() >= ctx.max_products {
                break;
            }

            let Some(id) = element
                .value()
                .attr(&self.id_attribute)
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                continue;
            };

            if !seen.insert(id.to_string()) {
                continue;
            }

            if let Some(product) = self.extract_one(element, id, ctx) {
                products.push(product);
            }
        }

        products
    }
}

/// Turns raw marketplace HTML into products through a priority-ordered
/// cascade of layouts. The first layout that yields anything wins.
pub struct HtmlProductParser {
    amazon_layouts: Vec<Box<dyn LayoutParser>>,
    flipkart_layouts: Vec<Box<dyn LayoutParser>>,
    amazon_base_url: String,
    flipkart_base_url: String,
    max_products: usize,
}

impl HtmlProductParser {
    pub fn new(config: &ScrapingConfig) -> Self {
        let max_products = config.result_cap();
        if max_products != config.max_products {
            warn!(
                "max_products = {} is out of range, capping results at {}",
                config.max_products, max_products
            );
        }

        Self {
            amazon_layouts: vec![
                Box::new(SelectorLayout::amazon_standard_grid()),
                Box::new(SelectorLayout::amazon_alternate_grid()),
                Box::new(SelectorLayout::amazon_mobile()),
            ],
            flipkart_layouts: vec![Box::new(SelectorLayout::flipkart_grid())],
            amazon_base_url: config.amazon_base_url.clone(),
            flipkart_base_url: config.flipkart_base_url.clone(),
            max_products,
        }
    }

    /// Register an extra layout at the end of a site's cascade.
    pub fn with_layout(mut self, site: Site, layout: Box<dyn LayoutParser>) -> Self {
        match site {
            Site::Amazon => self.amazon_layouts.push(layout),
            Site::Flipkart => self.flipkart_layouts.push(layout),
        }
        self
    }

    pub fn parse(&self, html: &str, keywords: &str, params: &ScrapingParams) -> Vec<Product> {
        let (layouts, base_url) = match params.site {
            Site::Amazon => (&self.amazon_layouts, self.amazon_base_url.as_str()),
            Site::Flipkart => (&self.flipkart_layouts, self.flipkart_base_url.as_str()),
        };

        let document = Html::parse_document(html);
        let ctx = ParseContext {
            keywords,
            params,
            base_url,
            max_products: self.max_products,
        };

        for layout in layouts {
            let products = layout.extract(&document, &ctx);
            if !products.is_empty() {
                info!("Layout '{}' extracted {} products", layout.name(), products.len());
                return products;
            }
            debug!("Layout '{}' found no products", layout.name());
        }

        info!("No products found using available layouts");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_GRID: &str = r#"
        <html><body>
        <div data-component-type="s-search-result" data-asin="B0C7SAM001">
            <h2><a class="a-link-normal" href="/Samsung-Galaxy-M34/dp/B0C7SAM001"><span>Samsung Galaxy M34 5G  (Midnight Blue, 6GB, 128GB) &amp;amp; Charger</span></a></h2>
            <img class="s-image" src="//m.media-amazon.com/images/I/71m34.jpg">
            <span class="a-price"><span class="a-offscreen">₹16,999.00</span><span class="a-price-whole">16,999.</span></span>
            <span class="a-price a-text-price"><span class="a-offscreen">₹24,999</span></span>
            <i class="a-icon a-icon-star-small"><span class="a-icon-alt">4.1 out of 5 stars</span></i>
            <span class="a-size-base s-underline-text">(12,345)</span>
            <span class="a-badge-text">Amazon's Choice</span>
        </div>
        <div data-component-type="s-search-result" data-asin="B0C7SPON01">
            <h2><a href="/x"><span>Sponsored Samsung Galaxy Ad</span></a></h2>
            <span class="a-price"><span class="a-offscreen">₹9,999</span></span>
        </div>
        <div data-component-type="s-search-result" data-asin="B0C7CASE01">
            <h2><a href="/y"><span>Silicone Back Cover for Tablets</span></a></h2>
            <span class="a-price"><span class="a-offscreen">₹299</span></span>
        </div>
        <div data-component-type="s-search-result" data-asin="B0C7NOPR01">
            <h2><a href="/z"><span>Samsung Galaxy S23 Ultra</span></a></h2>
            <span class="a-color-secondary">Currently unavailable.</span>
        </div>
        <div data-component-type="s-search-result" data-asin="B0C7SAM002">
            <h2><a href="https://www.amazon.in/dp/B0C7SAM002"><span>Samsung Galaxy A15 5G</span></a></h2>
            <img class="s-image" src="https://images-na.ssl-images-amazon.com/images/G/31/grey-pixel.gif">
            <span class="a-price"><span class="a-price-whole">12,499</span></span>
        </div>
        </body></html>
    "#;

    const ALTERNATE_GRID: &str = r#"
        <html><body>
        <div class="s-result-item" data-asin=""></div>
        <div class="s-result-item" data-asin="B0ALT00001">
            <a class="a-link-normal" href="/dp/B0ALT00001"><span class="a-size-medium a-text-normal">OnePlus Nord CE4 Lite</span></a>
            <img src="/images/I/nord.jpg">
            <span class="a-price"><span class="a-offscreen">₹19,999</span></span>
        </div>
        </body></html>
    "#;

    const FLIPKART_GRID: &str = r#"
        <html><body>
        <div data-id="MOBGTAGPTB3VS24W">
            <a class="CGtC98" href="/apple-iphone-15/p/itm6ac6485515ae4">
                <img class="DByuf4" src="https://rukminim2.flixcart.com/image/iphone15.jpg">
                <div class="KzDlHZ">Apple iPhone 15 (Black, 128 GB)</div>
                <div class="XQDdHH">4.6</div>
                <span class="Wphh3N">1,23,456 Ratings &amp; 5,432 Reviews</span>
                <div class="Nx9bqj">₹69,999</div>
                <img src="https://static-assets-web.flixcart.com/fk-assured.png">
            </a>
        </div>
        </body></html>
    "#;

    fn parser() -> HtmlProductParser {
        HtmlProductParser::new(&ScrapingConfig::default())
    }

    fn samsung_params() -> ScrapingParams {
        ScrapingParams {
            keywords: "samsung galaxy".to_string(),
            category: Some("smartphone".to_string()),
            brand: Some("samsung".to_string()),
            ..ScrapingParams::default()
        }
    }

    #[test]
    fn test_standard_grid_extraction() {
        let params = samsung_params();
        let products = parser().parse(STANDARD_GRID, "samsung galaxy", &params);

        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["B0C7SAM001", "B0C7SAM002"]);

        let first = &products[0];
        assert_eq!(
            first.title,
            "Samsung Galaxy M34 5G (Midnight Blue, 6GB, 128GB) & Charger"
        );
        assert_eq!(first.price, "₹16,999");
        assert_eq!(first.image, "https://m.media-amazon.com/images/I/71m34.jpg");
        assert_eq!(first.link, "https://www.amazon.in/Samsung-Galaxy-M34/dp/B0C7SAM001");
        assert_eq!(first.rating.as_deref(), Some("4.1"));
        assert_eq!(first.review_count.as_deref(), Some("12,345"));
        assert!(first.is_amazon_choice);
        assert_eq!(first.relevance_score, 1.0);
        assert_eq!(first.match_reasons.last().map(String::as_str), Some("ai_recommended"));
    }

    #[test]
    fn test_placeholder_image_replaced_with_stock() {
        let params = samsung_params();
        let products = parser().parse(STANDARD_GRID, "samsung galaxy", &params);

        let second = &products[1];
        assert_eq!(second.price, "₹12,499");
        assert!(second.image.contains("unsplash"));
        assert!(!second.is_amazon_choice);
        assert!(second.rating.is_none());
    }

    #[test]
    fn test_cascade_falls_through_to_alternate_grid() {
        let params = ScrapingParams::new("oneplus nord");
        let products = parser().parse(ALTERNATE_GRID, "oneplus nord", &params);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "B0ALT00001");
        assert_eq!(products[0].image, "https://www.amazon.in/images/I/nord.jpg");
        assert_eq!(products[0].link, "https://www.amazon.in/dp/B0ALT00001");
    }

    #[test]
    fn test_first_matching_layout_wins() {
        let html = format!("{}{}", STANDARD_GRID, ALTERNATE_GRID);
        let params = ScrapingParams::new("samsung galaxy oneplus");
        let products = parser().parse(&html, "samsung galaxy oneplus", &params);

        assert!(products.iter().all(|p| p.id.starts_with("B0C7")));
    }

    #[test]
    fn test_flipkart_layout() {
        let params = ScrapingParams {
            keywords: "iphone 15".to_string(),
            site: Site::Flipkart,
            ..ScrapingParams::default()
        };
        let products = parser().parse(FLIPKART_GRID, "iphone 15", &params);

        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.title, "Apple iPhone 15 (Black, 128 GB)");
        assert_eq!(product.price, "₹69,999");
        assert_eq!(product.link, "https://www.flipkart.com/apple-iphone-15/p/itm6ac6485515ae4");
        assert_eq!(product.rating.as_deref(), Some("4.6"));
        assert_eq!(product.review_count.as_deref(), Some("1,23,456"));
        assert!(product.is_amazon_choice);
    }

    fn redmi_listing(count: usize) -> String {
        let mut html = String::from("<html><body>");
        for i in 0..count {
            html.push_str(&format!(
                r#"<div data-component-type="s-search-result" data-asin="B0CAP{:05}"><h2><span>Redmi Note {}</span></h2><span class="a-price"><span class="a-offscreen">₹{}</span></span></div>"#,
                i,
                i,
                10000 + i
            ));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_results_are_capped() {
        let html = redmi_listing(40);
        let params = ScrapingParams::new("redmi note");
        let products = parser().parse(&html, "redmi note", &params);
        assert_eq!(products.len(), 20);
    }

    #[test]
    fn test_out_of_range_cap_is_clamped() {
        let html = redmi_listing(40);
        let params = ScrapingParams::new("redmi note");

        let zero = ScrapingConfig {
            max_products: 0,
            ..ScrapingConfig::default()
        };
        let products = HtmlProductParser::new(&zero).parse(&html, "redmi note", &params);
        assert_eq!(products.len(), 15);

        let huge = ScrapingConfig {
            max_products: 100,
            ..ScrapingConfig::default()
        };
        let products = HtmlProductParser::new(&huge).parse(&html, "redmi note", &params);
        assert_eq!(products.len(), 20);
    }

    /// Matches `<li class="deal">` items of a layout the built-in selectors don't know.
    struct DealListLayout;

    impl LayoutParser for DealListLayout {
        fn name(&self) -> &str {
            "deal_list"
        }

        fn extract(&self, document: &Html, ctx: &ParseContext) -> Vec<Product> {
            let Ok(item) = Selector::parse("li.deal") else {
                return Vec::new();
            };
            document
                .select(&item)
                .filter_map(|element| {
                    let id = element.value().attr("data-id")?;
                    Some(Product {
                        id: id.to_string(),
                        title: element.text().collect::<String>().trim().to_string(),
                        price: "₹9,999".to_string(),
                        link: format!("{}/dp/{}", ctx.base_url, id),
                        ..Product::default()
                    })
                })
                .take(ctx.max_products)
                .collect()
        }
    }

    #[test]
    fn test_registered_layout_extends_cascade() {
        let parser = parser().with_layout(Site::Amazon, Box::new(DealListLayout));
        let params = ScrapingParams::new("boat earbuds");

        let html = r#"<html><body><ul><li class="deal" data-id="DEAL01">boAt Airdopes 141</li></ul></body></html>"#;
        let products = parser.parse(html, "boat earbuds", &params);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "DEAL01");
        assert_eq!(products[0].title, "boAt Airdopes 141");
        assert_eq!(products[0].link, "https://www.amazon.in/dp/DEAL01");

        // built-in layouts still win when they match
        let products = parser.parse(STANDARD_GRID, "samsung galaxy", &samsung_params());
        assert!(products.iter().all(|p| p.id.starts_with("B0C7")));

        // registered for amazon only
        let flipkart = ScrapingParams {
            site: Site::Flipkart,
            ..params
        };
        assert!(parser.parse(html, "boat earbuds", &flipkart).is_empty());
    }

    #[test]
    fn test_garbage_input_yields_nothing() {
        let params = ScrapingParams::new("samsung");
        assert!(parser().parse("", "samsung", &params).is_empty());
        assert!(parser().parse("<<<not html>>>", "samsung", &params).is_empty());
    }

    #[test]
    fn test_is_valid_product() {
        assert!(is_valid_product("Samsung Galaxy M34", "samsung phone"));
        assert!(!is_valid_product("Deals of the Day: Samsung", "samsung"));
        assert!(!is_valid_product("Wooden Desk Lamp", "samsung phone"));
        assert!(is_valid_product("Anything", "tv"));
    }
}
