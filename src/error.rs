//! Error types for the lioengine crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Credentials never appear in error messages.

/// Errors that can occur while registering providers or finding updates.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The provider name is not on the allow-list.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A provider with this name is already registered on the session.
    #[error("provider already added: {0}")]
    DuplicateProvider(String),

    /// The outbound request for a provider could not be built.
    #[error("request construction failed for {provider}: {reason}")]
    RequestConstruction {
        /// Provider whose request template failed.
        provider: String,
        /// What went wrong during templating.
        reason: String,
    },

    /// A provider constructor rejected its setup input.
    #[error("provider setup failed for {provider}: {reason}")]
    ProviderSetup {
        /// Provider being constructed.
        provider: String,
        /// Why construction failed.
        reason: String,
    },

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// A provider did not finish within its timeout.
    #[error("provider timed out: {0}")]
    Timeout(String),

    /// A provider task stopped because the dispatch was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// A provider task panicked or was aborted before reporting.
    #[error("provider task failed: {0}")]
    Task(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for lioengine results.
pub type Result<T> = std::result::Result<T, EngineError>;
