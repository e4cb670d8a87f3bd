//! Error types for gated resource access
use std::sync::Arc;

use thiserror::Error;

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned when a hold cannot be granted.
///
/// Only [`Gate::acquire`](crate::Gate::acquire) fails; opening, closing and
/// releasing are total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The gate was not open when `acquire` ran: it was never opened, or a
    /// close has already started.
    #[error("Resource '{gate}' is closed")]
    ResourceClosed {
        /// Name of the gate that refused the hold
        gate: Arc<str>,
    },
}

impl Error {
    /// Create a closed-resource error for the named gate
    pub fn resource_closed(gate: impl Into<Arc<str>>) -> Self {
        Self::ResourceClosed { gate: gate.into() }
    }

    /// Name of the gate that produced this error
    #[must_use]
    pub fn gate_name(&self) -> &str {
        match self {
            Self::ResourceClosed { gate } => gate,
        }
    }

    /// Gate errors are never retried automatically.
    ///
    /// A caller that wants to try again simply calls
    /// [`Gate::acquire`](crate::Gate::acquire) again; it is the only race-free
    /// check. [`Gate::is_open`](crate::Gate::is_open) is safe to poll from
    /// any thread, but its answer may be stale by the time `acquire` runs.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}
