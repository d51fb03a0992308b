//! Provider registry: allow-list, constructors, and registration.
//!
//! A [`ProviderRegistry`] owns the allow-list it was built with and a map
//! from provider name to constructor. Sessions share a registry through
//! `Arc`; [`add_provider`] consults each session's registry and attaches
//! the new instance to every listed session, or to none of them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::provider::{Credential, ProviderInstance};
use crate::providers::{BingProvider, bing};
use crate::session::Session;

/// Constructor turning a credential into a ready provider instance.
pub type ProviderSetup = Arc<dyn Fn(Credential) -> Result<ProviderInstance> + Send + Sync>;

/// Maps allow-listed provider names to their constructors.
#[derive(Clone)]
pub struct ProviderRegistry {
    config: EngineConfig,
    setups: HashMap<String, ProviderSetup>,
}

impl ProviderRegistry {
    /// Build a registry from `config`, with the built-in Bing constructor
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_builtins(config))
    }

    fn with_builtins(config: EngineConfig) -> Self {
        let bing_config = config.clone();
        let mut registry = Self::bare(config);
        registry.register_setup(bing::NAME, move |credential| {
            BingProvider::setup(credential, &bing_config)
        });
        registry
    }

    /// A registry with the given allow-list and no constructors.
    ///
    /// Allow-listed names without a constructor still register, as
    /// instances that dispatch skips.
    pub fn with_allow_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::bare(EngineConfig {
            supported_providers: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    fn bare(config: EngineConfig) -> Self {
        Self {
            config,
            setups: HashMap::new(),
        }
    }

    /// Map `name` to a constructor, replacing any previous one.
    ///
    /// The name must also be on the allow-list to be registrable.
    pub fn register_setup<F>(&mut self, name: impl Into<String>, setup: F) -> &mut Self
    where
        F: Fn(Credential) -> Result<ProviderInstance> + Send + Sync + 'static,
    {
        self.setups.insert(name.into(), Arc::new(setup));
        self
    }

    /// Configuration this registry was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The allow-list, in configured order.
    pub fn supported(&self) -> &[String] {
        &self.config.supported_providers
    }

    /// Exact, case-sensitive allow-list check.
    pub fn is_supported(&self, name: &str) -> bool {
        self.config.supported_providers.iter().any(|p| p == name)
    }

    /// Whether `name` has a constructor.
    pub fn has_setup(&self, name: &str) -> bool {
        self.setups.contains_key(name)
    }

    /// Construct a new instance of `name`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnsupportedProvider`] if `name` is not allow-listed.
    /// - [`EngineError::ProviderSetup`] if the credential is blank or the
    ///   constructor fails.
    pub fn setup(&self, name: &str, credential: Credential) -> Result<ProviderInstance> {
        if !self.is_supported(name) {
            return Err(EngineError::UnsupportedProvider(name.to_string()));
        }
        if credential.is_blank() {
            return Err(EngineError::ProviderSetup {
                provider: name.to_string(),
                reason: "credential must not be empty".into(),
            });
        }
        match self.setups.get(name) {
            Some(setup) => setup(credential),
            None => {
                tracing::debug!(provider = name, "no constructor, registering without capability");
                Ok(ProviderInstance::without_capability(name, credential))
            }
        }
    }
}

impl Default for ProviderRegistry {
    /// The default allow-list with the built-in constructors.
    fn default() -> Self {
        Self::with_builtins(EngineConfig::default())
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut setups: Vec<&String> = self.setups.keys().collect();
        setups.sort();
        f.debug_struct("ProviderRegistry")
            .field("supported", &self.config.supported_providers)
            .field("setups", &setups)
            .finish()
    }
}

/// Register provider `name` with `credential` on every session in `sessions`.
///
/// Designed to be called repeatedly to add providers one at a time. The
/// call is all-or-nothing: every session is checked and every instance
/// constructed before any session changes. A session listed more than once
/// is treated as listed once.
///
/// # Errors
///
/// - [`EngineError::DuplicateProvider`] if any session already has `name`.
/// - [`EngineError::UnsupportedProvider`] if any session's registry does
///   not allow `name`.
/// - [`EngineError::ProviderSetup`] if a constructor rejects the credential.
pub fn add_provider(name: &str, credential: &str, sessions: &[&Session]) -> Result<()> {
    let mut targets: Vec<&Session> = Vec::with_capacity(sessions.len());
    for session in sessions {
        if !targets.iter().any(|t| t.id() == session.id()) {
            targets.push(session);
        }
    }
    // Stable lock order so concurrent calls cannot deadlock.
    targets.sort_by_key(|s| s.id());

    let mut guards: Vec<_> = targets.iter().map(|s| s.lock_providers()).collect();

    for (session, guard) in targets.iter().zip(&guards) {
        if guard.iter().any(|p| p.name() == name) {
            tracing::warn!(provider = name, session = %session.id(), "provider already added");
            return Err(EngineError::DuplicateProvider(name.to_string()));
        }
        if !session.registry().is_supported(name) {
            tracing::warn!(provider = name, "provider not supported");
            return Err(EngineError::UnsupportedProvider(name.to_string()));
        }
    }

    let instances = targets
        .iter()
        .map(|s| {
            s.registry()
                .setup(name, Credential::new(credential))
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>>>()?;

    for (guard, instance) in guards.iter_mut().zip(instances) {
        guard.push(instance);
    }

    tracing::info!(provider = name, sessions = targets.len(), "provider added");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_allows_bing_and_twitter() {
        let registry = ProviderRegistry::new(EngineConfig::default()).unwrap();
        assert!(registry.is_supported("Bing"));
        assert!(registry.is_supported("Twitter"));
        assert!(registry.has_setup("Bing"));
        assert!(!registry.has_setup("Twitter"));
    }

    #[test]
    fn default_registry_matches_default_config() {
        let registry = ProviderRegistry::default();
        assert_eq!(registry.config(), &EngineConfig::default());
        assert!(registry.has_setup("Bing"));
    }

    #[test]
    fn allow_list_match_is_case_sensitive() {
        let registry = ProviderRegistry::new(EngineConfig::default()).unwrap();
        assert!(!registry.is_supported("bing"));
        assert!(!registry.is_supported("BING"));
        assert!(!registry.is_supported(" Bing"));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig {
            supported_providers: vec![],
            ..Default::default()
        };
        assert!(matches!(
            ProviderRegistry::new(config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn setup_unsupported_name_fails() {
        let registry = ProviderRegistry::with_allow_list(["Bing"]);
        let err = registry.setup("Myspace", Credential::new("t")).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedProvider(ref n) if n == "Myspace"));
    }

    #[test]
    fn setup_blank_credential_fails() {
        let registry = ProviderRegistry::with_allow_list(["Twitter"]);
        let err = registry.setup("Twitter", Credential::new("   ")).unwrap_err();
        assert!(matches!(err, EngineError::ProviderSetup { .. }));
    }

    #[test]
    fn setup_without_constructor_has_no_capability() {
        let registry = ProviderRegistry::with_allow_list(["Twitter"]);
        let instance = registry.setup("Twitter", Credential::new("t")).unwrap();
        assert!(instance.capability().is_none());
    }

    #[test]
    fn injected_constructor_is_used() {
        let mut registry = ProviderRegistry::with_allow_list(["Custom"]);
        registry.register_setup("Custom", |credential| {
            Ok(ProviderInstance::without_capability("Custom", credential))
        });
        assert!(registry.has_setup("Custom"));
        let instance = registry.setup("Custom", Credential::new("abc")).unwrap();
        assert_eq!(instance.credential().expose(), "abc");
    }

    #[test]
    fn registered_setup_still_needs_allow_list() {
        let mut registry = ProviderRegistry::with_allow_list(["Bing"]);
        registry.register_setup("Hidden", |credential| {
            Ok(ProviderInstance::without_capability("Hidden", credential))
        });
        assert!(registry.setup("Hidden", Credential::new("t")).is_err());
    }

    #[test]
    fn debug_lists_names_only() {
        let registry = ProviderRegistry::new(EngineConfig::default()).unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("Bing"));
        assert!(debug.contains("Twitter"));
    }

    fn session_with(names: &[&str]) -> Session {
        Session::new(Arc::new(ProviderRegistry::with_allow_list(names.iter().copied())))
    }

    #[test]
    fn add_then_duplicate_keeps_one_instance() {
        let session = session_with(&["Bing", "Twitter"]);
        add_provider("Twitter", "tok", &[&session]).unwrap();
        let err = add_provider("Twitter", "tok", &[&session]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProvider(ref n) if n == "Twitter"));
        assert_eq!(session.provider_count(), 1);
    }

    #[test]
    fn unsupported_name_leaves_session_unchanged() {
        let session = session_with(&["Bing"]);
        for name in ["Myspace", "bing", "", "Twitter"] {
            let err = add_provider(name, "tok", &[&session]).unwrap_err();
            assert!(matches!(err, EngineError::UnsupportedProvider(_)), "{name}");
        }
        assert_eq!(session.provider_count(), 0);
    }

    #[test]
    fn multi_session_registration_is_all_or_nothing() {
        let a = session_with(&["Bing", "Twitter"]);
        let b = session_with(&["Bing", "Twitter"]);
        add_provider("Twitter", "tok", &[&b]).unwrap();

        let err = add_provider("Twitter", "tok", &[&a, &b]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProvider(_)));
        assert_eq!(a.provider_count(), 0);
        assert_eq!(b.provider_count(), 1);

        add_provider("Bing", "tok", &[&a, &b]).unwrap();
        assert_eq!(a.provider_names(), vec!["Bing"]);
        assert_eq!(b.provider_names(), vec!["Twitter", "Bing"]);
    }

    #[test]
    fn multi_session_respects_each_allow_list() {
        let a = session_with(&["Bing", "Twitter"]);
        let b = session_with(&["Bing"]);
        let err = add_provider("Twitter", "tok", &[&a, &b]).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedProvider(_)));
        assert_eq!(a.provider_count(), 0);
    }

    #[test]
    fn setup_failure_aborts_every_session() {
        let a = session_with(&["Twitter"]);
        let b = session_with(&["Twitter"]);
        let err = add_provider("Twitter", "", &[&a, &b]).unwrap_err();
        assert!(matches!(err, EngineError::ProviderSetup { .. }));
        assert_eq!(a.provider_count(), 0);
        assert_eq!(b.provider_count(), 0);
    }

    #[test]
    fn same_session_listed_twice_counts_once() {
        let session = session_with(&["Twitter"]);
        add_provider("Twitter", "tok", &[&session, &session]).unwrap();
        assert_eq!(session.provider_count(), 1);
    }

    #[test]
    fn empty_session_list_is_a_no_op() {
        assert!(add_provider("Anything", "tok", &[]).is_ok());
    }
}
