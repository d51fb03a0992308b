//! Shared HTTP client construction for provider requests.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// User-Agent sent when the config does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("lioengine/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for provider API calls.
///
/// The client has:
/// - Timeout from config (no client timeout when disabled)
/// - User-Agent from config, or [`DEFAULT_USER_AGENT`]
/// - At most 10 redirects
///
/// # Errors
///
/// Returns [`EngineError::Http`] if the client cannot be constructed.
pub fn build_client(config: &EngineConfig) -> Result<reqwest::Client> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    let mut builder = reqwest::Client::builder()
        .user_agent(ua)
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10));
    if let Some(timeout) = config.provider_timeout() {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| EngineError::Http(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_names_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("lioengine/"));
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua_and_no_timeout() {
        let config = EngineConfig {
            user_agent: Some("CustomBot/1.0".into()),
            provider_timeout_secs: 0,
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
