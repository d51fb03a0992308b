//! # lioengine
//!
//! Finds news and updates about a project by querying several update
//! providers at once and merging what they return.
//!
//! ## Design
//!
//! - Providers are registered by name against an allow-list, at most once
//!   per session
//! - Each query fans out to every registered provider on its own task and
//!   waits for all of them
//! - Requests are built fresh per query from each provider's URL template
//! - Graceful degradation: a failing provider is reported, the others
//!   still return records
//! - A pluggable post-processing stage runs over the merged records
//!   (identity by default)
//!
//! ## Security
//!
//! - Credentials are opaque and never appear in logs, errors, or `Debug`
//!   output
//! - No network listeners: this is a library, not a server

pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod postprocess;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod session;
pub mod types;

pub use config::{BingConfig, EngineConfig};
pub use error::{EngineError, Result};
pub use orchestrator::ProviderFailure;
pub use postprocess::{Identity, MergeBySource, PostProcessor};
pub use provider::{Credential, OutboundRequest, ProviderInstance, RequestTemplate, UpdateProvider};
pub use registry::{ProviderRegistry, add_provider};
pub use session::{Session, UpdateReport};
pub use types::{Img, Update};

/// Create an empty session with the default allow-list and the built-in
/// providers.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> lioengine::Result<()> {
/// let session = lioengine::new_session();
/// lioengine::add_provider("Bing", "my-api-key", &[&session])?;
/// for update in session.find_updates("tokio").await? {
///     println!("{}: {}", update.title, update.link);
/// }
/// # Ok(())
/// # }
/// ```
pub fn new_session() -> Session {
    Session::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_session_finds_nothing_without_providers() {
        let session = new_session();
        assert_eq!(session.provider_count(), 0);
        let updates = session.find_updates("tokio").await.unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn bing_registers_once_per_session() {
        let session = new_session();
        add_provider("Bing", "key", &[&session]).unwrap();
        let err = add_provider("Bing", "key", &[&session]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProvider(_)));
        assert_eq!(session.provider_names(), vec!["Bing"]);
    }

    #[test]
    fn unknown_provider_rejected() {
        let session = new_session();
        let err = add_provider("Myspace", "key", &[&session]).unwrap_err();
        assert_eq!(err.to_string(), "unsupported provider: Myspace");
        assert_eq!(session.provider_count(), 0);
    }
}
