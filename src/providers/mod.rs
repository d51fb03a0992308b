//! Built-in provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::UpdateProvider`]
//! plus a `setup` constructor the registry maps its allow-list name to.

pub mod bing;

pub use bing::BingProvider;

/// Allow-list name reserved for a Twitter provider. It has no constructor,
/// so registering it yields an instance that dispatch skips.
pub const TWITTER: &str = "Twitter";
