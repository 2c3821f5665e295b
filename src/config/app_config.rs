use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{MinioConfig, NerConfig, ScrapingConfig};

pub const DEFAULT_CONFIG_PATH: &str = "src/configs/discovery.toml";
pub const ENV_PREFIX: &str = "DISCOVERY";

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scraping: ScrapingConfig,
    pub ner: NerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Minio,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub minio: MinioConfig,
}

impl AppConfig {
    /// Load the TOML file (if present) and apply `DISCOVERY__SECTION__KEY`
    /// environment overrides on top, then resolve credentials.
    pub fn load(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration from {}", path))?;

        config.ner.load_credentials();
        if config.storage.backend == StorageBackend::Minio {
            config
                .storage
                .minio
                .load_credentials()
                .context("MinIO storage backend selected but credentials are missing")?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.scraping.max_products, 20);
    }

    #[test]
    fn test_toml_sections_deserialize() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:3000"

            [scraping]
            timeout_seconds = 15

            [storage]
            backend = "minio"

            [storage.minio]
            bucket_name = "chats-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.scraping.timeout_seconds, 15);
        assert_eq!(config.storage.backend, StorageBackend::Minio);
        assert_eq!(config.storage.minio.bucket_name, "chats-test");
        assert_eq!(config.storage.minio.endpoint, "http://localhost:9000");
    }
}
