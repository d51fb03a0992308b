//! Capability trait and per-session provider instances.
//!
//! Each backend (Bing, test doubles, ...) implements [`UpdateProvider`].
//! The registry wraps a backend in a [`ProviderInstance`] together with the
//! credential and request template it was set up with. Outbound requests
//! are built fresh for every dispatch by [`build_request`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{PROJECT_PLACEHOLDER, QUANTITY_PLACEHOLDER};
use crate::error::{EngineError, Result};
use crate::types::Update;

/// A pluggable update provider.
///
/// Implementors run one search per dispatch on their own task and return
/// normalised [`Update`] records. Each implementation handles its own:
///
/// - HTTP request with the appropriate auth header
/// - decoding of the provider payload
/// - error mapping for rate limiting or malformed responses
///
/// Implementations should stop promptly once `cancel` fires.
#[async_trait]
pub trait UpdateProvider: Send + Sync {
    /// Stable provider name, matching its allow-list entry.
    fn name(&self) -> &str;

    /// Run a search for the already-built `request`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the request fails or the response cannot
    /// be decoded. The error is recorded against this provider only.
    async fn search(
        &self,
        request: &OutboundRequest,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Vec<Update>>;
}

/// Opaque provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for placing in an auth header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// URL pattern plus default result quantity for a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    /// URL with `{project}` and `{quantity}` placeholders.
    pub url: String,
    /// Number of results to ask for.
    pub quantity: u32,
}

/// A fully built request for one provider and one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Provider the request belongs to.
    pub provider: String,
    /// Project name as given by the caller.
    pub project: String,
    /// Requested result quantity.
    pub quantity: u32,
    /// Absolute URL with every placeholder substituted.
    pub url: Url,
}

/// Build the outbound request for `provider` from its template.
///
/// The project name is percent-encoded before substitution. Pure: the same
/// inputs always give the same request, and nothing is cached.
///
/// # Errors
///
/// Returns [`EngineError::RequestConstruction`] if the project name is
/// blank, the template is empty, or the substituted URL does not parse.
pub fn build_request(
    provider: &str,
    template: &RequestTemplate,
    project: &str,
) -> Result<OutboundRequest> {
    let fail = |reason: String| EngineError::RequestConstruction {
        provider: provider.to_string(),
        reason,
    };

    if project.trim().is_empty() {
        return Err(fail("project name must not be empty".into()));
    }
    if template.url.is_empty() {
        return Err(fail("no URL template".into()));
    }

    let raw = template
        .url
        .replace(PROJECT_PLACEHOLDER, &urlencoding::encode(project))
        .replace(QUANTITY_PLACEHOLDER, &template.quantity.to_string());
    let url = Url::parse(&raw).map_err(|e| fail(format!("invalid URL {raw:?}: {e}")))?;

    Ok(OutboundRequest {
        provider: provider.to_string(),
        project: project.to_string(),
        quantity: template.quantity,
        url,
    })
}

/// One configured provider attached to a session.
///
/// Immutable after construction; a session shares instances with in-flight
/// dispatches through `Arc`.
#[derive(Clone)]
pub struct ProviderInstance {
    name: String,
    credential: Credential,
    template: RequestTemplate,
    capability: Option<Arc<dyn UpdateProvider>>,
}

impl ProviderInstance {
    /// An instance backed by a search capability.
    pub fn new(
        name: impl Into<String>,
        credential: Credential,
        template: RequestTemplate,
        capability: Arc<dyn UpdateProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            credential,
            template,
            capability: Some(capability),
        }
    }

    /// An allow-listed instance with no search capability yet. Dispatch
    /// skips it.
    pub fn without_capability(name: impl Into<String>, credential: Credential) -> Self {
        Self {
            name: name.into(),
            credential,
            template: RequestTemplate::default(),
            capability: None,
        }
    }

    /// Provider name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Credential supplied at registration.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Request template set up by the provider constructor.
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// The search capability, if this provider has one.
    pub fn capability(&self) -> Option<&Arc<dyn UpdateProvider>> {
        self.capability.as_ref()
    }

    /// Build this instance's request for `project`.
    ///
    /// # Errors
    ///
    /// See [`build_request`].
    pub fn build_request(&self, project: &str) -> Result<OutboundRequest> {
        build_request(&self.name, &self.template, project)
    }
}

impl fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("name", &self.name)
            .field("credential", &self.credential)
            .field("template", &self.template)
            .field("has_capability", &self.capability.is_some())
            .finish()
    }
}
