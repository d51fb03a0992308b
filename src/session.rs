//! Aggregation session: the public entry point for finding updates.
//!
//! A [`Session`] owns the providers registered on it and runs the fan-out
//! engine over them for each query. The provider list is guarded by a
//! mutex and snapshotted at the start of every dispatch, so providers
//! added while a query is in flight only take part in later queries.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;
use crate::orchestrator::{self, ProviderFailure};
use crate::postprocess::{Identity, PostProcessor};
use crate::provider::ProviderInstance;
use crate::registry::{self, ProviderRegistry};
use crate::types::Update;

/// Outcome of one query, including what went wrong per provider.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Post-processed updates from every successful provider.
    pub updates: Vec<Update>,
    /// Providers whose search failed. Their records are absent.
    pub failures: Vec<ProviderFailure>,
    /// Providers registered without a search capability.
    pub skipped: Vec<String>,
    /// Number of provider tasks that ran.
    pub tasks_launched: usize,
}

impl UpdateReport {
    /// Whether every launched provider succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A set of registered providers queried together.
pub struct Session {
    id: Uuid,
    registry: Arc<ProviderRegistry>,
    providers: Mutex<Vec<Arc<ProviderInstance>>>,
    post_processor: Arc<dyn PostProcessor>,
    cancel: CancellationToken,
}

impl Session {
    /// Create an empty session backed by `registry`, with the identity
    /// post-processor.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            providers: Mutex::new(Vec::new()),
            post_processor: Arc::new(Identity),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the post-processing stage.
    pub fn with_post_processor(mut self, post_processor: impl PostProcessor + 'static) -> Self {
        self.post_processor = Arc::new(post_processor);
        self
    }

    /// Unique session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Registry this session validates and constructs providers with.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub(crate) fn lock_providers(&self) -> MutexGuard<'_, Vec<Arc<ProviderInstance>>> {
        self.providers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `name` on this session only. See [`registry::add_provider`].
    ///
    /// # Errors
    ///
    /// Same as [`registry::add_provider`].
    pub fn add_provider(&self, name: &str, credential: &str) -> Result<()> {
        registry::add_provider(name, credential, &[self])
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.lock_providers().len()
    }

    /// Registered provider names in registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.lock_providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Registration index of the provider called `name`.
    pub fn provider_index(&self, name: &str) -> Option<usize> {
        self.lock_providers().iter().position(|p| p.name() == name)
    }

    /// The provider called `name`, if registered.
    pub fn provider(&self, name: &str) -> Option<Arc<ProviderInstance>> {
        self.lock_providers()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Token cancelled by [`Session::shutdown`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every in-flight query. Providers still running report
    /// cancellation failures; later queries fail the same way.
    pub fn shutdown(&self) {
        tracing::info!(session = %self.id, "session shutting down");
        self.cancel.cancel();
    }

    /// Find updates for `project` across every registered provider.
    ///
    /// Per-provider failures are logged and dropped; use
    /// [`Session::find_updates_report`] to inspect them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::RequestConstruction`] if any provider's
    /// request cannot be built. No partial results are returned then.
    pub async fn find_updates(&self, project: &str) -> Result<Vec<Update>> {
        let report = self.find_updates_report(project).await?;
        if !report.is_complete() {
            tracing::warn!(
                project,
                failed = report.failures.len(),
                returned = report.updates.len(),
                "returning partial results"
            );
        }
        Ok(report.updates)
    }

    /// Find updates for `project`, returning per-provider failures
    /// alongside the records.
    ///
    /// # Errors
    ///
    /// Same as [`Session::find_updates`].
    pub async fn find_updates_report(&self, project: &str) -> Result<UpdateReport> {
        let providers: Vec<Arc<ProviderInstance>> = self.lock_providers().clone();
        tracing::debug!(session = %self.id, project, providers = providers.len(), "finding updates");

        let outcome = orchestrator::dispatch(
            &providers,
            project,
            self.registry.config().provider_timeout(),
            &self.cancel,
        )
        .await
        .inspect_err(|e| tracing::error!(project, error = %e, "dispatch failed"))?;

        Ok(UpdateReport {
            updates: self.post_processor.process(outcome.updates),
            failures: outcome.failures,
            skipped: outcome.skipped,
            tasks_launched: outcome.tasks_launched,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(ProviderRegistry::default()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("providers", &self.provider_names())
            .finish()
    }
}
