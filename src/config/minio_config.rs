use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Object-store settings for the chat transcript backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinioConfig {
    pub endpoint: String,
    pub bucket_name: String,
    pub region: Option<String>,
    pub path_style: Option<bool>,
    /// Key prefix under which chats are stored
    pub prefix: String,
    // Optional environment variable names for customization
    pub env_access_key: Option<String>,
    pub env_secret_key: Option<String>,
    // These fields are loaded from environment variables
    #[serde(skip)]
    pub access_key: Option<String>,
    #[serde(skip)]
    pub secret_key: Option<String>,
}

impl MinioConfig {
    pub fn load_credentials(&mut self) -> Result<()> {
        let access_key_var = self.env_access_key.as_deref().unwrap_or("MINIO_ACCESS_KEY");
        let secret_key_var = self.env_secret_key.as_deref().unwrap_or("MINIO_SECRET_KEY");

        self.access_key = env::var(access_key_var)
            .with_context(|| format!("Missing environment variable: {}", access_key_var))?
            .into();

        self.secret_key = env::var(secret_key_var)
            .with_context(|| format!("Missing environment variable: {}", secret_key_var))?
            .into();

        Ok(())
    }

    pub fn get_access_key(&self) -> Result<&str> {
        self.access_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Access key not loaded"))
    }

    pub fn get_secret_key(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Secret key not loaded"))
    }

    pub fn is_path_style(&self) -> bool {
        self.path_style.unwrap_or(true)
    }

    pub fn get_region(&self) -> &str {
        self.region.as_deref().unwrap_or("us-east-1")
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(anyhow::anyhow!("MinIO endpoint cannot be empty"));
        }

        if self.bucket_name.is_empty() {
            return Err(anyhow::anyhow!("MinIO bucket name cannot be empty"));
        }

        if self.access_key.is_none() {
            return Err(anyhow::anyhow!("MinIO access key not loaded"));
        }

        if self.secret_key.is_none() {
            return Err(anyhow::anyhow!("MinIO secret key not loaded"));
        }

        Ok(())
    }
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket_name: "product-discovery".to_string(),
            region: Some("us-east-1".to_string()),
            path_style: Some(true),
            prefix: "chats".to_string(),
            env_access_key: None,
            env_secret_key: None,
            access_key: None,
            secret_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MinioConfig::default();
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.bucket_name, "product-discovery");
        assert_eq!(config.prefix, "chats");
        assert_eq!(config.get_region(), "us-east-1");
        assert!(config.is_path_style());
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = MinioConfig::default();
        assert!(config.validate().is_err());

        config.access_key = Some("access".to_string());
        config.secret_key = Some("secret".to_string());
        assert!(config.validate().is_ok());

        config.bucket_name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_loading() {
        unsafe {
            env::set_var("TEST_CHAT_MINIO_ACCESS_KEY", "test_access");
            env::set_var("TEST_CHAT_MINIO_SECRET_KEY", "test_secret");
        }

        let mut config = MinioConfig::default();
        config.env_access_key = Some("TEST_CHAT_MINIO_ACCESS_KEY".to_string());
        config.env_secret_key = Some("TEST_CHAT_MINIO_SECRET_KEY".to_string());

        let result = config.load_credentials();
        assert!(result.is_ok());
        assert_eq!(config.get_access_key().unwrap(), "test_access");
        assert_eq!(config.get_secret_key().unwrap(), "test_secret");

        unsafe {
            env::remove_var("TEST_CHAT_MINIO_ACCESS_KEY");
            env::remove_var("TEST_CHAT_MINIO_SECRET_KEY");
        }
    }
}
