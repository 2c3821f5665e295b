use crate::config::MinioConfig;
use crate::models::{Chat, ChatMessage, Role};
use crate::storage::chat_store::{ChatStore, StoreError};
use crate::storage::storage_manager::StorageManager;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use serde_json::Value;
use tracing::{debug, info};

/// Chat persistence on an S3-compatible object store. Every chat header and
/// every message is its own object, so each write is atomic on its own.
pub struct MinioChatStore {
    bucket: Bucket,
    prefix: String,
}

impl MinioChatStore {
    pub fn from_config(config: &MinioConfig) -> Result<Self> {
        config.validate()?;

        let region = Region::Custom {
            region: config.get_region().to_owned(),
            endpoint: config.endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(config.get_access_key()?),
            Some(config.get_secret_key()?),
            None, // security_token
            None, // session_token
            None, // expiration
        )?;

        let bucket = Bucket::new(&config.bucket_name, region, credentials)?;

        // MinIO needs path-style addressing
        let bucket = if config.is_path_style() {
            *bucket.with_path_style()
        } else {
            *bucket
        };

        Ok(MinioChatStore {
            bucket,
            prefix: config.prefix.clone(),
        })
    }

    pub async fn ensure_bucket(&self) -> Result<()> {
        match self.bucket.exists().await {
            Ok(true) => {
                info!("Bucket '{}' already exists", self.bucket.name);
            }
            Ok(false) => {
                let config = s3::BucketConfiguration::default();
                s3::Bucket::create(
                    &self.bucket.name,
                    self.bucket.region.clone(),
                    self.bucket.credentials().await?,
                    config,
                )
                .await
                .map_err(|e| anyhow!("Failed to create bucket: {}", e))?;
                info!("Created bucket: {}", self.bucket.name);
            }
            Err(e) => {
                return Err(anyhow!("Failed to check bucket existence: {}", e));
            }
        }
        Ok(())
    }

    pub fn get_bucket_name(&self) -> &str {
        &self.bucket.name
    }

    async fn put_json(&self, key: &str, value: &impl serde::Serialize) -> Result<(), StoreError> {
        let body = serde_json::to_vec(value)?;
        let response = self
            .bucket
            .put_object_with_content_type(key, &body, "application/json")
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if response.status_code() == 200 {
            debug!("Stored object: {}", key);
            Ok(())
        } else {
            Err(StoreError::Backend(format!(
                "Failed to store {}: HTTP {}",
                key,
                response.status_code()
            )))
        }
    }

    /// `None` when the object does not exist.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 200 => Ok(Some(response.bytes().to_vec())),
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) => Err(StoreError::Backend(format!(
                "Failed to get {}: HTTP {}",
                key,
                response.status_code()
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let list = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut keys = Vec::new();
        for result in list {
            for object in result.contents {
                keys.push(object.key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn require_chat(&self, chat_id: &str) -> Result<(), StoreError> {
        let key = StorageManager::chat_key(&self.prefix, chat_id);
        match self.get_bytes(&key).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::ChatNotFound(chat_id.to_string())),
        }
    }
}

#[async_trait]
impl ChatStore for MinioChatStore {
    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: StorageManager::new_chat_id(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };

        let key = StorageManager::chat_key(&self.prefix, &chat.id);
        self.put_json(&key, &chat).await?;
        info!("Created chat {} ({})", chat.id, key);

        Ok(chat)
    }

    async fn append_message(
        &self,
        chat_id: &str,
        role: Role,
        content: &str,
        metadata: Value,
    ) -> Result<ChatMessage, StoreError> {
        self.require_chat(chat_id).await?;

        let message = ChatMessage {
            id: StorageManager::new_message_id(),
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };

        let key = StorageManager::message_key(&self.prefix, chat_id, message.created_at);
        self.put_json(&key, &message).await?;

        Ok(message)
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        self.require_chat(chat_id).await?;

        let prefix = StorageManager::messages_prefix(&self.prefix, chat_id);
        let mut messages = Vec::new();
        for key in self.list_keys(&prefix).await? {
            if let Some(bytes) = self.get_bytes(&key).await? {
                messages.push(serde_json::from_slice::<ChatMessage>(&bytes)?);
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_with_credentials() -> MinioConfig {
        let mut config = MinioConfig::default();
        config.access_key = Some("test_access".to_string());
        config.secret_key = Some("test_secret".to_string());
        config
    }

    #[test]
    fn test_store_from_config() {
        let store = MinioChatStore::from_config(&config_with_credentials()).unwrap();
        assert_eq!(store.get_bucket_name(), "product-discovery");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(MinioChatStore::from_config(&MinioConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        // Needs a running MinIO instance
        if std::env::var("MINIO_TEST_ENABLED").is_err() {
            return;
        }

        let mut config = MinioConfig::default();
        config.bucket_name = "product-discovery-test".to_string();
        config.load_credentials().unwrap();
        let store = MinioChatStore::from_config(&config).unwrap();
        store.ensure_bucket().await.unwrap();

        let chat = store.create_chat("u1", "round trip").await.unwrap();
        store
            .append_message(&chat.id, Role::User, "first", json!({}))
            .await
            .unwrap();
        store
            .append_message(&chat.id, Role::Assistant, "second", json!({ "products": [] }))
            .await
            .unwrap();

        let messages = store.list_messages(&chat.id).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);

        assert!(matches!(
            store.list_messages("no-such-chat").await,
            Err(StoreError::ChatNotFound(_))
        ));
    }
}
