use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use wreq::Client;
use wreq_util::Emulation;

/// Text fragments that only show up on challenge / block pages.
const BOT_DETECTION_MARKERS: [&str; 9] = [
    "captcha",
    "robot check",
    "type the characters you see",
    "/errors/validatecaptcha",
    "automated access",
    "are you a human",
    "unusual traffic",
    "request blocked",
    "you have been blocked",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Empty HTML response")]
    EmptyBody,
    #[error("Invalid HTML content")]
    InvalidHtml,
    #[error("Bot detection triggered ({0})")]
    BotDetected(&'static str),
    #[error("No products found in page")]
    NoProducts,
    #[error("Invalid search URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    pub fn is_bot_detection(&self) -> bool {
        matches!(self, FetchError::BotDetected(_))
    }
}

/// A fully prepared marketplace request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<String, FetchError>;
}

/// First bot-detection marker found in the page, if any.
pub fn detect_bot_marker(html: &str) -> Option<&'static str> {
    let lower = html.to_lowercase();
    BOT_DETECTION_MARKERS
        .iter()
        .find(|marker| lower.contains(**marker))
        .copied()
}

/// Browser-emulating HTTP fetcher.
pub struct WreqPageFetcher {
    client: Client,
}

impl WreqPageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(WreqPageFetcher { client })
    }

    async fn fetch_inner(&self, request: &PageRequest) -> Result<String, FetchError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response text: {}", e)))?;

        if html.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        // Basic HTML validation
        if !html.contains("<html") && !html.contains("<div") && !html.contains("<body") {
            return Err(FetchError::InvalidHtml);
        }

        info!("Successfully fetched {} characters from {}", html.len(), request.url);
        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for WreqPageFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String, FetchError> {
        tokio::time::timeout(request.timeout, self.fetch_inner(request))
            .await
            .map_err(|_| FetchError::Timeout(request.timeout))?
    }
}
