//! Bing News Search provider.
//!
//! Calls the News Search JSON API with the subscription key in a request
//! header and maps each article onto an [`Update`]. Articles that fail to
//! decode are skipped rather than failing the whole response.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::http;
use crate::provider::{Credential, OutboundRequest, ProviderInstance, RequestTemplate, UpdateProvider};
use crate::types::{Img, Update};

/// Allow-list name of this provider.
pub const NAME: &str = "Bing";

/// Payload kind tag attached to every Bing record for ranking.
const KIND: &str = "bing-news";

/// Bing News Search client.
pub struct BingProvider {
    client: reqwest::Client,
    key_header: String,
}

impl BingProvider {
    /// Set up a Bing [`ProviderInstance`] from a credential, filling in the
    /// URL template and quantity from `config.bing`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProviderSetup`] if the credential is blank or
    /// the HTTP client cannot be built.
    pub fn setup(credential: Credential, config: &EngineConfig) -> Result<ProviderInstance> {
        if credential.is_blank() {
            return Err(EngineError::ProviderSetup {
                provider: NAME.into(),
                reason: "credential must not be empty".into(),
            });
        }
        let client = http::build_client(config).map_err(|e| EngineError::ProviderSetup {
            provider: NAME.into(),
            reason: e.to_string(),
        })?;
        let template = RequestTemplate {
            url: config.bing.url_template.clone(),
            quantity: config.bing.quantity,
        };
        let provider = Self {
            client,
            key_header: config.bing.key_header.clone(),
        };
        Ok(ProviderInstance::new(NAME, credential, template, Arc::new(provider)))
    }

    async fn fetch(&self, request: &OutboundRequest, credential: &Credential) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(request.url.clone())
            .header(self.key_header.as_str(), credential.expose())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| EngineError::Http(format!("Bing request failed: {}", e.without_url())))?
            .error_for_status()
            .map_err(|e| EngineError::Http(format!("Bing HTTP error: {}", e.without_url())))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| EngineError::Http(format!("Bing response read failed: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl UpdateProvider for BingProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        request: &OutboundRequest,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Vec<Update>> {
        tracing::debug!(project = %request.project, quantity = request.quantity, "Bing search");

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(EngineError::Cancelled("Bing search cancelled".into()));
            }
            body = self.fetch(request, credential) => body?,
        };

        tracing::trace!(bytes = body.len(), "Bing response received");
        parse_news_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    name: String,
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date_published: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image: Option<NewsImage>,
}

#[derive(Debug, Deserialize)]
struct NewsImage {
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Thumbnail {
    content_url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Decode a News Search JSON body into updates.
///
/// Extracted as a separate function for testability with canned payloads.
fn parse_news_response(body: &[u8]) -> Result<Vec<Update>> {
    let response: NewsResponse = serde_json::from_slice(body)
        .map_err(|e| EngineError::Parse(format!("Bing response is not valid JSON: {e}")))?;

    let mut updates = Vec::with_capacity(response.value.len());
    for value in response.value {
        let raw = serde_json::to_vec(&value).unwrap_or_default();
        let article: NewsArticle = match serde_json::from_value(value) {
            Ok(article) => article,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed Bing article");
                continue;
            }
        };

        let mut update = Update::new(article.name, article.description, article.url)
            .with_date_published(article.date_published)
            .with_category(article.category.unwrap_or_default())
            .with_source(NAME)
            .with_ranking_input(KIND, raw);
        if let Some(thumb) = article.image.and_then(|i| i.thumbnail) {
            update = update.with_img(Img {
                link: thumb.content_url,
                width: thumb.width,
                height: thumb.height,
            });
        }
        updates.push(update);
    }

    tracing::debug!(count = updates.len(), "Bing results parsed");
    Ok(updates)
}
