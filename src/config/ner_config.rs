use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Settings for the external named-entity-recognition service.
///
/// The API key never lives in the config file; it is read from the
/// environment variable named by `env_api_key` when the config is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub env_api_key: Option<String>,
    pub timeout_seconds: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl NerConfig {
    /// Resolve the API key from the environment. A missing key is not an
    /// error: it disables the ML extraction path.
    pub fn load_credentials(&mut self) {
        let key_var = self.env_api_key.as_deref().unwrap_or("HUGGINGFACE_API_KEY");
        self.api_key = env::var(key_var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    /// The endpoint and credential, if the ML path can run at all.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if !self.enabled || self.endpoint.is_empty() {
            return None;
        }
        self.api_key
            .as_deref()
            .map(|key| (self.endpoint.as_str(), key))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api-inference.huggingface.co/models/dslim/bert-base-NER"
                .to_string(),
            env_api_key: None,
            timeout_seconds: 10,
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_disables_ml_path() {
        let mut config = NerConfig::default();
        config.env_api_key = Some("TEST_NER_KEY_THAT_IS_NOT_SET".to_string());
        config.load_credentials();

        assert!(config.api_key.is_none());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_credentials_loading() {
        unsafe {
            env::set_var("TEST_NER_API_KEY", "hf_test");
        }

        let mut config = NerConfig::default();
        config.env_api_key = Some("TEST_NER_API_KEY".to_string());
        config.load_credentials();

        let (endpoint, key) = config.credentials().unwrap();
        assert!(endpoint.contains("bert-base-NER"));
        assert_eq!(key, "hf_test");

        config.enabled = false;
        assert!(config.credentials().is_none());

        unsafe {
            env::remove_var("TEST_NER_API_KEY");
        }
    }
}
