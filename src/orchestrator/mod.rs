//! Fan-out engine: one concurrent task per provider, joined before return.
//!
//! Requests are built per dispatch, searches run on a `JoinSet`, and a
//! shared cancellation token stops every running task when a later
//! provider's request cannot be built.

pub mod fanout;

pub use fanout::{DispatchOutcome, ProviderFailure, dispatch};
