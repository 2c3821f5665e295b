use anyhow::Context;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::{AppConfig, StorageBackend};
use crate::fetcher::{EntityRecognizer, HuggingFaceNerClient, WreqPageFetcher};
use crate::models::{
    ChatRequest, ChatResponse, ChatTurn, ErrorResponse, ExtractedFeatures, Role, ScrapingParams,
};
use crate::pipeline::discovery::ProductDiscovery;
use crate::pipeline::events::{ChatEvent, ChatEvents};
use crate::pipeline::response_composer::compose_response;
use crate::processor::TextFeatureExtractor;
use crate::storage::{ChatStore, InMemoryChatStore, MinioChatStore, StoreError};

const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Failed to create chat: {0}")]
    ChatCreation(#[source] StoreError),
    #[error("Failed to encode message metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl TurnError {
    pub fn status_code(&self) -> u16 {
        match self {
            TurnError::BadRequest(_) => 400,
            _ => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        match self {
            TurnError::BadRequest(details) => {
                ErrorResponse::new("Missing required fields", details.clone())
            }
            other => ErrorResponse::new(
                "Sorry, I encountered an error processing your request.",
                other.to_string(),
            ),
        }
    }
}

/// Steps of a single turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Received,
    FeaturesExtracted,
    ChatResolved,
    UserMessagePersisted,
    ProductsAcquired,
    ResponseComposed,
    AssistantMessagePersisted,
    Done,
}

/// Runs one inbound chat message through extraction, discovery and persistence.
///
/// Persistence failures after the chat exists are logged and the turn goes on;
/// only failing to create a new chat ends the turn early.
pub struct ChatTurnOrchestrator {
    extractor: TextFeatureExtractor,
    discovery: ProductDiscovery,
    store: Arc<dyn ChatStore>,
    events: ChatEvents,
}

impl ChatTurnOrchestrator {
    pub fn new(
        extractor: TextFeatureExtractor,
        discovery: ProductDiscovery,
        store: Arc<dyn ChatStore>,
    ) -> Self {
        Self {
            extractor,
            discovery,
            store,
            events: ChatEvents::new(),
        }
    }

    /// Wire the live collaborators described by the configuration.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let recognizer = HuggingFaceNerClient::from_config(&config.ner)
            .context("Failed to initialize NER client")?
            .map(|client| Arc::new(client) as Arc<dyn EntityRecognizer>);
        let extractor = TextFeatureExtractor::new(recognizer)?;

        let fetcher = Arc::new(WreqPageFetcher::new().context("Failed to build HTTP client")?);
        let discovery = ProductDiscovery::new(fetcher, &config.scraping);

        let store: Arc<dyn ChatStore> = match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory chat store");
                Arc::new(InMemoryChatStore::new())
            }
            StorageBackend::Minio => {
                let store = MinioChatStore::from_config(&config.storage.minio)
                    .context("Failed to initialize MinIO chat store")?;
                store.ensure_bucket().await?;
                info!(
                    "Using MinIO chat store: {}@{}",
                    config.storage.minio.bucket_name, config.storage.minio.endpoint
                );
                Arc::new(store)
            }
        };

        Ok(Self::new(extractor, discovery, store))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub fn discovery(&self) -> &ProductDiscovery {
        &self.discovery
    }

    pub fn extractor(&self) -> &TextFeatureExtractor {
        &self.extractor
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, TurnError> {
        let (message, user_id) = validate(&request)?;
        transition("new", TurnState::Received);

        let features = self.extractor.extract(message).await;
        transition("new", TurnState::FeaturesExtracted);

        let chat_id = self.resolve_chat(request.chat_id.as_deref(), user_id, message).await?;
        transition(&chat_id, TurnState::ChatResolved);

        let user_metadata = metadata(&[("extracted_features", serde_json::to_value(&features)?)]);
        if let Err(e) = self
            .store
            .append_message(&chat_id, Role::User, message, user_metadata)
            .await
        {
            error!("Failed to persist user message for chat {}: {}", chat_id, e);
        }
        transition(&chat_id, TurnState::UserMessagePersisted);

        let params = scraping_params(message, &features);
        let discovered = self.discovery.discover(&params).await;
        let products = discovered.products;
        transition(&chat_id, TurnState::ProductsAcquired);

        let ai_response_text = compose_response(&features, products.len());
        transition(&chat_id, TurnState::ResponseComposed);

        let assistant_metadata = metadata(&[
            ("products", serde_json::to_value(&products)?),
            ("extracted_features", serde_json::to_value(&features)?),
            ("source", serde_json::to_value(discovered.source)?),
        ]);
        if let Err(e) = self
            .store
            .append_message(&chat_id, Role::Assistant, &ai_response_text, assistant_metadata)
            .await
        {
            error!("Failed to persist assistant message for chat {}: {}", chat_id, e);
        }
        transition(&chat_id, TurnState::AssistantMessagePersisted);

        self.events.publish(ChatEvent::TurnCompleted {
            chat_id: chat_id.clone(),
            product_count: products.len(),
            source: discovered.source,
        });
        transition(&chat_id, TurnState::Done);

        Ok(ChatTurn {
            chat_id,
            user_message: message.to_string(),
            extracted_features: features,
            products,
            ai_response_text,
        }
        .into())
    }

    async fn resolve_chat(
        &self,
        chat_id: Option<&str>,
        user_id: &str,
        message: &str,
    ) -> Result<String, TurnError> {
        if let Some(chat_id) = chat_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(chat_id.to_string());
        }

        let title = chat_title(message);
        let chat = self
            .store
            .create_chat(user_id, &title)
            .await
            .map_err(TurnError::ChatCreation)?;

        info!("Created chat {} for user {}", chat.id, user_id);
        self.events.publish(ChatEvent::ChatCreated {
            chat_id: chat.id.clone(),
            user_id: user_id.to_string(),
            title,
        });

        Ok(chat.id)
    }
}

/// Blank checks trim; the message itself is passed on verbatim.
fn validate(request: &ChatRequest) -> Result<(&str, &str), TurnError> {
    let message = request.message.as_deref().unwrap_or_default();
    let user_id = request.user_id.as_deref().map(str::trim).unwrap_or_default();

    if message.trim().is_empty() || user_id.is_empty() {
        return Err(TurnError::BadRequest(
            "message and user_id are required".to_string(),
        ));
    }
    Ok((message, user_id))
}

fn transition(chat_id: &str, state: TurnState) {
    info!("Chat turn {} -> {:?}", chat_id, state);
}

/// First 50 characters of the message, with an ellipsis when cut.
pub fn chat_title(message: &str) -> String {
    if message.chars().count() > TITLE_MAX_CHARS {
        let head: String = message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        message.to_string()
    }
}

fn scraping_params(message: &str, features: &ExtractedFeatures) -> ScrapingParams {
    let entities = &features.entities;
    let keywords = if entities.keywords.is_empty() {
        message.to_string()
    } else {
        entities.keywords.join(" ")
    };

    ScrapingParams {
        keywords,
        category: entities.category.clone(),
        min_price: entities.min_price(),
        max_price: entities.max_price(),
        brand: entities.brand.clone(),
        ..ScrapingParams::default()
    }
}

fn metadata(entries: &[(&str, Value)]) -> Value {
    let map: Map<String, Value> = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    Value::Object(map)
}
