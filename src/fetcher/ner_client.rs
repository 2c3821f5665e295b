use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::NerConfig;

#[derive(Debug, Error)]
pub enum NerError {
    #[error("NER transport error: {0}")]
    Transport(String),
    #[error("NER service returned HTTP {0}")]
    Status(u16),
    #[error("NER request timed out after {0:?}")]
    Timeout(Duration),
    #[error("NER response could not be decoded: {0}")]
    Decode(String),
}

/// One entity reported by the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NerEntity {
    #[serde(alias = "entity")]
    pub entity_group: String,
    pub word: String,
    #[serde(default)]
    pub score: f64,
}

impl NerEntity {
    /// Lower-cased word with sub-word markers removed.
    pub fn normalized_word(&self) -> String {
        self.word.replace("##", "").trim().to_lowercase()
    }
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn infer(&self, text: &str) -> Result<Vec<NerEntity>, NerError>;
}

/// Client for a Hugging Face style token-classification endpoint.
pub struct HuggingFaceNerClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HuggingFaceNerClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// `None` when the service is disabled or no credential was found.
    pub fn from_config(config: &NerConfig) -> anyhow::Result<Option<Self>> {
        match config.credentials() {
            Some((endpoint, api_key)) => {
                info!("NER service configured at {}", endpoint);
                Ok(Some(Self::new(endpoint, api_key, config.timeout())?))
            }
            None => {
                info!("NER credential not configured, pattern extraction only");
                Ok(None)
            }
        }
    }

    async fn send(&self, text: &str) -> Result<Value, NerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| NerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NerError::Status(response.status().as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| NerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EntityRecognizer for HuggingFaceNerClient {
    async fn infer(&self, text: &str) -> Result<Vec<NerEntity>, NerError> {
        let body = tokio::time::timeout(self.timeout, self.send(text))
            .await
            .map_err(|_| NerError::Timeout(self.timeout))??;

        let entities = parse_entities(body)?;
        debug!("NER entities: {:?}", entities);
        Ok(entities)
    }
}

/// Accepts both the flat `[{..}]` shape and the batched `[[{..}]]` shape.
pub fn parse_entities(body: Value) -> Result<Vec<NerEntity>, NerError> {
    let items = match body {
        Value::Array(items) => items,
        other => {
            return Err(NerError::Decode(format!(
                "expected an entity array, got {}",
                other
            )));
        }
    };

    let flattened: Vec<Value> = items
        .into_iter()
        .flat_map(|item| match item {
            Value::Array(inner) => inner,
            single => vec![single],
        })
        .collect();

    flattened
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| NerError::Decode(e.to_string())))
        .collect()
}
