//! Concurrent per-provider fan-out with a join barrier.
//!
//! For each provider, in registration order, the outbound request is built
//! and one search task is spawned. The caller is suspended until every
//! spawned task has reported. Provider failures are collected, not
//! propagated; a request construction failure cancels the tasks already
//! running and aborts the dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Result};
use crate::provider::{OutboundRequest, ProviderInstance, UpdateProvider};
use crate::types::Update;

/// A provider whose search did not succeed.
#[derive(Debug)]
pub struct ProviderFailure {
    /// Provider name.
    pub provider: String,
    /// What went wrong.
    pub error: EngineError,
}

/// Everything a completed dispatch produced.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Records from successful providers, grouped in registration order.
    pub updates: Vec<Update>,
    /// Providers that failed, in registration order.
    pub failures: Vec<ProviderFailure>,
    /// Providers skipped because they have no search capability.
    pub skipped: Vec<String>,
    /// Number of search tasks spawned.
    pub tasks_launched: usize,
}

/// Query every provider in `providers` for `project` concurrently.
///
/// # Pipeline
///
/// 1. For each provider with a capability, build its request with
///    [`ProviderInstance::build_request`]
/// 2. Spawn one search task per provider onto a [`JoinSet`]
/// 3. Bound each search by `timeout` and by a child of `cancel`
/// 4. Drain the set; log and collect per-provider failures
/// 5. Concatenate records in registration order
///
/// Providers without a capability are skipped: no task, no error.
///
/// # Errors
///
/// Returns [`EngineError::RequestConstruction`] if any request cannot be
/// built. Tasks spawned before the failure see their token cancelled and
/// are drained before returning, so none outlive the call.
pub async fn dispatch(
    providers: &[Arc<ProviderInstance>],
    project: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<DispatchOutcome> {
    let cancel = cancel.child_token();
    let mut tasks: JoinSet<(usize, Result<Vec<Update>>)> = JoinSet::new();
    let mut pending: BTreeMap<usize, String> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (index, instance) in providers.iter().enumerate() {
        let Some(capability) = instance.capability().cloned() else {
            tracing::debug!(provider = instance.name(), "no search capability, skipping");
            skipped.push(instance.name().to_string());
            continue;
        };

        let request = match instance.build_request(project) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(
                    provider = instance.name(),
                    error = %err,
                    running = pending.len(),
                    "request construction failed, cancelling dispatch"
                );
                cancel.cancel();
                while tasks.join_next().await.is_some() {}
                return Err(err);
            }
        };

        pending.insert(index, instance.name().to_string());
        let instance = Arc::clone(instance);
        let token = cancel.clone();
        tasks.spawn(async move {
            let result = run_search(capability, &instance, request, timeout, &token).await;
            (index, result)
        });
        // Let the new task reach its first await before the next build.
        tokio::task::yield_now().await;
    }

    let tasks_launched = pending.len();
    tracing::debug!(project, tasks = tasks_launched, "provider tasks launched");

    let mut succeeded: BTreeMap<usize, Vec<Update>> = BTreeMap::new();
    let mut failed: BTreeMap<usize, ProviderFailure> = BTreeMap::new();

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                // Attributed below: the index stays in `pending`.
                tracing::error!(error = %e, "provider task did not complete");
                continue;
            }
        };
        let provider = pending.remove(&index).unwrap_or_default();
        match result {
            Ok(updates) => {
                tracing::debug!(%provider, count = updates.len(), "provider returned updates");
                succeeded.insert(index, updates);
            }
            Err(error) => {
                tracing::warn!(%provider, %error, "provider search failed");
                failed.insert(index, ProviderFailure { provider, error });
            }
        }
    }

    for (index, provider) in pending {
        failed.insert(
            index,
            ProviderFailure {
                error: EngineError::Task(format!("{provider} search task panicked")),
                provider,
            },
        );
    }

    Ok(DispatchOutcome {
        updates: succeeded.into_values().flatten().collect(),
        failures: failed.into_values().collect(),
        skipped,
        tasks_launched,
    })
}

/// Run one provider search, bounded by `timeout` and `cancel`.
async fn run_search(
    capability: Arc<dyn UpdateProvider>,
    instance: &ProviderInstance,
    request: OutboundRequest,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Vec<Update>> {
    let search = capability.search(&request, instance.credential(), cancel);
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, search)
                .await
                .unwrap_or_else(|_| {
                    Err(EngineError::Timeout(format!(
                        "{} exceeded {limit:?}",
                        instance.name()
                    )))
                }),
            None => search.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::Cancelled(format!(
            "{} search cancelled",
            instance.name()
        ))),
        result = bounded => result,
    }
}
