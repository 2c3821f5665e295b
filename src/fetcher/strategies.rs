//! Concrete marketplace search strategies. Each one produces a different
//! request shape (endpoint, user agent, header set) for the same query so
//! that a block on one fingerprint does not end the whole scrape.

use rand::Rng;
use rand::seq::SliceRandom;
use url::Url;

use crate::config::ScrapingConfig;
use crate::fetcher::page_fetcher::{FetchError, PageRequest};
use crate::models::{ScrapingParams, Site};

pub trait ScrapeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn build_request(
        &self,
        params: &ScrapingParams,
        config: &ScrapingConfig,
    ) -> Result<PageRequest, FetchError>;
}

/// Strategies in the order they are attempted.
pub fn default_strategies() -> Vec<Box<dyn ScrapeStrategy>> {
    vec![
        Box::new(PrimarySearchStrategy),
        Box::new(AlternateEndpointStrategy),
        Box::new(MobileSearchStrategy),
    ]
}

/// Desktop browser against the canonical search endpoint.
pub struct PrimarySearchStrategy;

/// Rotates between alternate search endpoints.
pub struct AlternateEndpointStrategy;

/// Mobile browser fingerprint.
pub struct MobileSearchStrategy;

impl ScrapeStrategy for PrimarySearchStrategy {
    fn name(&self) -> &'static str {
        "advanced_primary"
    }

    fn build_request(
        &self,
        params: &ScrapingParams,
        config: &ScrapingConfig,
    ) -> Result<PageRequest, FetchError> {
        let base = config.base_url(params.site);
        let url = match params.site {
            Site::Amazon => amazon_search_url(base, "/s", "k", params, "nb_sb_noss")?,
            Site::Flipkart => flipkart_search_url(base, params, "search")?,
        };

        Ok(PageRequest {
            url,
            headers: browser_headers(params.site, &config.desktop_user_agents, config, false),
            timeout: config.timeout(),
        })
    }
}

impl ScrapeStrategy for AlternateEndpointStrategy {
    fn name(&self) -> &'static str {
        "alternative_endpoint"
    }

    fn build_request(
        &self,
        params: &ScrapingParams,
        config: &ScrapingConfig,
    ) -> Result<PageRequest, FetchError> {
        let base = config.base_url(params.site);
        let use_legacy_path = rand::thread_rng().gen_bool(0.5);

        let url = match params.site {
            Site::Amazon if use_legacy_path => {
                let mut url =
                    amazon_search_url(base, "/s/ref=nb_sb_noss", "field-keywords", params, "nb_sb_noss_1")?;
                url.push_str("&url=search-alias%3Daps");
                url
            }
            Site::Amazon => amazon_search_url(base, "/gp/search", "keywords", params, "sr_nr_p_36")?,
            Site::Flipkart => flipkart_search_url(base, params, "search_autosuggest")?,
        };

        Ok(PageRequest {
            url,
            headers: browser_headers(params.site, &config.desktop_user_agents, config, false),
            timeout: config.timeout(),
        })
    }
}

impl ScrapeStrategy for MobileSearchStrategy {
    fn name(&self) -> &'static str {
        "mobile_user_agent"
    }

    fn build_request(
        &self,
        params: &ScrapingParams,
        config: &ScrapingConfig,
    ) -> Result<PageRequest, FetchError> {
        let base = config.base_url(params.site);
        let url = match params.site {
            Site::Amazon => amazon_search_url(base, "/s", "k", params, "nb_sb_noss_2")?,
            Site::Flipkart => flipkart_search_url(base, params, "search_mobile")?,
        };

        Ok(PageRequest {
            url,
            headers: browser_headers(params.site, &config.mobile_user_agents, config, true),
            timeout: config.timeout(),
        })
    }
}

/// Browse node ids for the categories the extractor can produce.
fn amazon_category_node(category: &str) -> Option<&'static str> {
    match category {
        "smartphone" => Some("1805560031"),
        "laptop" => Some("1375424031"),
        "tablet" => Some("1375458031"),
        "headphones" => Some("1388921031"),
        "watch" => Some("5605728031"),
        "camera" => Some("1389175031"),
        _ => None,
    }
}

fn parse_base(base: &str, path: &str) -> Result<Url, FetchError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", joined, e)))
}

fn amazon_search_url(
    base: &str,
    path: &str,
    query_param: &str,
    params: &ScrapingParams,
    tracking_ref: &str,
) -> Result<String, FetchError> {
    let mut url = parse_base(base, path)?;

    let mut refinements = Vec::new();
    if let Some(node) = params.category.as_deref().and_then(amazon_category_node) {
        refinements.push(format!("n:{}", node));
    }
    if params.has_price_bounds() {
        // p_36 is expressed in paise
        let min = params.min_price.map(|v| v.saturating_mul(100).to_string()).unwrap_or_default();
        let max = params.max_price.map(|v| v.saturating_mul(100).to_string()).unwrap_or_default();
        refinements.push(format!("p_36:{}-{}", min, max));
    }

    {
        let mut query = url.query_pairs_mut();
        query.append_pair(query_param, params.keywords.trim());
        if !refinements.is_empty() {
            query.append_pair("rh", &refinements.join(","));
        }
        query.append_pair("s", "relevanceblender");
        query.append_pair("ref", tracking_ref);
    }

    Ok(url.to_string())
}

fn flipkart_search_url(
    base: &str,
    params: &ScrapingParams,
    otracker: &str,
) -> Result<String, FetchError> {
    let mut url = parse_base(base, "/search")?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("q", params.keywords.trim());
        query.append_pair("otracker", otracker);
        query.append_pair("sort", "relevance");
        if let Some(min) = params.min_price {
            query.append_pair("p[]", &format!("facets.price_range.from={}", min));
        }
        if let Some(max) = params.max_price {
            query.append_pair("p[]", &format!("facets.price_range.to={}", max));
        }
    }

    Ok(url.to_string())
}

/// A plausible, randomized browser header set with synthetic session cookies.
fn browser_headers(
    site: Site,
    user_agents: &[String],
    config: &ScrapingConfig,
    mobile: bool,
) -> Vec<(String, String)> {
    let mut rng = rand::thread_rng();

    let user_agent = user_agents
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| "Mozilla/5.0".to_string());
    let accept_language = config
        .accept_languages
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| "en-IN,en;q=0.9".to_string());

    let cookie = match site {
        Site::Amazon => format!(
            "session-id={:03}-{:07}-{:07}; ubid-acbin={:03}-{:07}-{:07}; i18n-prefs=INR; lc-acbin=en_IN",
            rng.gen_range(100..1000),
            rng.gen_range(1_000_000..10_000_000),
            rng.gen_range(1_000_000..10_000_000),
            rng.gen_range(100..1000),
            rng.gen_range(1_000_000..10_000_000),
            rng.gen_range(1_000_000..10_000_000),
        ),
        Site::Flipkart => format!(
            "T=TI{}{:06}; SN=VI{:016X}; K-ACTION=null",
            chrono::Utc::now().timestamp_millis(),
            rng.gen_range(0..1_000_000),
            rng.r#gen::<u64>(),
        ),
    };

    let mut headers = vec![
        ("User-Agent".to_string(), user_agent),
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language".to_string(), accept_language),
        ("Cache-Control".to_string(), "no-cache".to_string()),
        ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
        ("Sec-Fetch-Dest".to_string(), "document".to_string()),
        ("Sec-Fetch-Mode".to_string(), "navigate".to_string()),
        ("Sec-Fetch-Site".to_string(), "none".to_string()),
        ("Cookie".to_string(), cookie),
    ];

    if mobile {
        headers.push(("Sec-CH-UA-Mobile".to_string(), "?1".to_string()));
        headers.push(("Viewport-Width".to_string(), "390".to_string()));
    }
    if rng.gen_bool(0.5) {
        headers.push(("DNT".to_string(), "1".to_string()));
    }

    headers
}
