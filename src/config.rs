//! Provider configuration.
//!
//! The provider is configured with `{client_id, secret, token?, base_url?}`.
//! Each field falls back to an environment variable so CI setups can avoid
//! embedding credentials in configuration.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Default base URL of the Port API.
pub const DEFAULT_BASE_URL: &str = "https://api.getport.io";

/// Environment variable holding the client ID.
pub const ENV_CLIENT_ID: &str = "PORT_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "PORT_CLIENT_SECRET";
/// Environment variable holding the base URL.
pub const ENV_BASE_URL: &str = "PORT_BASE_URL";
/// Environment variable gating beta resources (pages, folders).
pub const ENV_BETA_FEATURES: &str = "PORT_BETA_FEATURES_ENABLED";

/// Provider configuration as handed over by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client ID. Falls back to `PORT_CLIENT_ID`.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret. Falls back to `PORT_CLIENT_SECRET`.
    #[serde(default)]
    pub secret: Option<String>,
    /// Pre-issued bearer token. When set, the token exchange is skipped.
    #[serde(default)]
    pub token: Option<String>,
    /// API base URL. Falls back to `PORT_BASE_URL`, then the default.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Parse a configuration object and apply environment fallbacks.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        let mut config: ProviderConfig = serde_json::from_value(value)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.client_id.is_none() {
            self.client_id = env_non_empty(ENV_CLIENT_ID);
        }
        if self.secret.is_none() {
            self.secret = env_non_empty(ENV_CLIENT_SECRET);
        }
        if self.base_url.is_none() {
            self.base_url = env_non_empty(ENV_BASE_URL);
        }
    }

    /// The effective base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Validate that either a token or a client-ID/secret pair is available.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.token.is_some() {
            return Ok(());
        }
        match (&self.client_id, &self.secret) {
            (Some(_), Some(_)) => Ok(()),
            (None, _) => Err(ProviderError::Configuration(format!(
                "missing client_id; set it in the provider configuration or via {}",
                ENV_CLIENT_ID
            ))),
            (_, None) => Err(ProviderError::Configuration(format!(
                "missing secret; set it in the provider configuration or via {}",
                ENV_CLIENT_SECRET
            ))),
        }
    }
}

/// Whether beta resources (pages, folders) are enabled.
pub fn beta_features_enabled() -> bool {
    std::env::var(ENV_BETA_FEATURES)
        .map(|v| v == "true")
        .unwrap_or(false)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_from_value() {
        let config = ProviderConfig::from_value(json!({
            "client_id": "cid",
            "secret": "sec",
            "base_url": "https://api.example.test"
        }))
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("cid"));
        assert_eq!(config.base_url(), "https://api.example.test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_base_url() {
        let config = ProviderConfig {
            token: Some("t".into()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_token_bypasses_credentials() {
        let config = ProviderConfig {
            token: Some("pre-issued".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_is_configuration_error() {
        let config = ProviderConfig {
            client_id: Some("cid".into()),
            secret: None,
            token: None,
            base_url: None,
        };
        // Only meaningful when the env var is not set in the test environment
        if std::env::var(ENV_CLIENT_SECRET).is_err() {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ProviderError::Configuration(_)));
            assert!(err.to_string().contains(ENV_CLIENT_SECRET));
        }
    }
}
