//! Engine configuration with sensible defaults.
//!
//! [`EngineConfig`] carries the provider allow-list, the per-provider
//! timeout, and the defaults each built-in provider is set up with. It is
//! passed by value into [`crate::registry::ProviderRegistry`], so tests can
//! supply their own allow-list without touching shared state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::providers::{TWITTER, bing};

/// Placeholder replaced by the percent-encoded project name.
pub const PROJECT_PLACEHOLDER: &str = "{project}";

/// Placeholder replaced by the provider's result quantity.
pub const QUANTITY_PLACEHOLDER: &str = "{quantity}";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Provider names accepted by `add_provider`. Matching is exact and
    /// case-sensitive.
    pub supported_providers: Vec<String>,
    /// Per-provider search timeout in seconds. `0` disables the timeout.
    pub provider_timeout_secs: u64,
    /// Custom User-Agent for outbound HTTP. `None` uses the crate default.
    pub user_agent: Option<String>,
    /// Bing provider defaults.
    pub bing: BingConfig,
}

/// Defaults for the Bing news provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BingConfig {
    /// URL template containing `{project}` and optionally `{quantity}`.
    pub url_template: String,
    /// Number of results requested per search.
    pub quantity: u32,
    /// Header carrying the subscription key.
    pub key_header: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            supported_providers: vec![bing::NAME.into(), TWITTER.into()],
            provider_timeout_secs: 30,
            user_agent: None,
            bing: BingConfig::default(),
        }
    }
}

impl Default for BingConfig {
    fn default() -> Self {
        Self {
            url_template:
                "https://api.cognitive.microsoft.com/bing/v7.0/news/search?q={project}&count={quantity}"
                    .into(),
            quantity: 10,
            key_header: "Ocp-Apim-Subscription-Key".into(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/lioengine/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("lioengine").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("lioengine")
                .join("config.toml")
        } else {
            PathBuf::from("lioengine.toml")
        }
    }

    /// Per-provider timeout, or `None` when disabled.
    pub fn provider_timeout(&self) -> Option<std::time::Duration> {
        (self.provider_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.provider_timeout_secs))
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - the allow-list is not empty and has no blank entries
    /// - the Bing quantity is greater than 0
    /// - the Bing URL template contains `{project}`
    /// - the Bing key header is a valid HTTP header name
    pub fn validate(&self) -> Result<()> {
        if self.supported_providers.is_empty() {
            return Err(EngineError::Config(
                "at least one supported provider is required".into(),
            ));
        }
        if self.supported_providers.iter().any(|p| p.trim().is_empty()) {
            return Err(EngineError::Config(
                "supported provider names must not be blank".into(),
            ));
        }
        if self.bing.quantity == 0 {
            return Err(EngineError::Config(
                "bing.quantity must be greater than 0".into(),
            ));
        }
        if !self.bing.url_template.contains(PROJECT_PLACEHOLDER) {
            return Err(EngineError::Config(format!(
                "bing.url_template must contain {PROJECT_PLACEHOLDER}"
            )));
        }
        if let Err(e) = reqwest::header::HeaderName::from_bytes(self.bing.key_header.as_bytes()) {
            return Err(EngineError::Config(format!(
                "bing.key_header is not a valid header name: {e}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = EngineConfig::default();
        assert_eq!(config.supported_providers, vec!["Bing", "Twitter"]);
        assert_eq!(config.provider_timeout_secs, 30);
        assert!(config.user_agent.is_none());
        assert_eq!(config.bing.quantity, 10);
        assert!(config.bing.url_template.contains(PROJECT_PLACEHOLDER));
        assert!(config.bing.url_template.contains(QUANTITY_PLACEHOLDER));
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_allow_list_rejected() {
        let config = EngineConfig {
            supported_providers: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("supported provider"));
    }

    #[test]
    fn blank_allow_list_entry_rejected() {
        let config = EngineConfig {
            supported_providers: vec!["Bing".into(), "  ".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut config = EngineConfig::default();
        config.bing.quantity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn template_without_project_rejected() {
        let mut config = EngineConfig::default();
        config.bing.url_template = "https://example.com/search".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("{project}"));
    }

    #[test]
    fn default_allow_list_names_the_built_in_providers() {
        let config = EngineConfig::default();
        assert_eq!(
            config.supported_providers,
            vec![bing::NAME.to_string(), TWITTER.to_string()]
        );
    }

    #[test]
    fn invalid_key_header_rejected() {
        for bad in ["", "Bad Header", "Key:Value", "Ocp\nKey"] {
            let mut config = EngineConfig::default();
            config.bing.key_header = bad.into();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("key_header"), "{bad:?}");
        }
    }

    #[test]
    fn custom_key_header_accepted() {
        let mut config = EngineConfig::default();
        config.bing.key_header = "X-Api-Key".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_disables_timeout() {
        let config = EngineConfig {
            provider_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.provider_timeout().is_none());
        assert_eq!(
            EngineConfig::default().provider_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let toml_str = r#"
supported_providers = ["Bing"]

[bing]
quantity = 25
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.supported_providers, vec!["Bing"]);
        assert_eq!(config.bing.quantity, 25);
        assert_eq!(config.provider_timeout_secs, 30);
        assert_eq!(config.bing.key_header, "Ocp-Apim-Subscription-Key");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = EngineConfig {
            provider_timeout_secs: 5,
            user_agent: Some("lio-test/1.0".into()),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "supported_providers = 7").unwrap();
        let err = EngineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
