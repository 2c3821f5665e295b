use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data_models::Product;
use super::features::ExtractedFeatures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat session as recorded by the persistence store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One transcript entry. Messages are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Products embedded in an assistant message's metadata snapshot.
    pub fn products(&self) -> Option<Vec<Product>> {
        let products = self.metadata.get("products")?;
        serde_json::from_value(products.clone()).ok()
    }

    pub fn extracted_features(&self) -> Option<ExtractedFeatures> {
        let features = self.metadata.get("extracted_features")?;
        serde_json::from_value(features.clone()).ok()
    }
}

/// Inbound chat request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            user_id: Some(user_id.into()),
            chat_id: None,
        }
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// Successful turn payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub chat_id: String,
    pub response: String,
    pub extracted_features: ExtractedFeatures,
    pub products: Vec<Product>,
    pub success: bool,
}

/// Failed turn payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
            success: false,
        }
    }
}

/// Working state of one inbound message while it moves through the orchestrator.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub chat_id: String,
    pub user_message: String,
    pub extracted_features: ExtractedFeatures,
    pub products: Vec<Product>,
    pub ai_response_text: String,
}

impl From<ChatTurn> for ChatResponse {
    fn from(turn: ChatTurn) -> Self {
        Self {
            chat_id: turn.chat_id,
            response: turn.ai_response_text,
            extracted_features: turn.extracted_features,
            products: turn.products,
            success: true,
        }
    }
}
