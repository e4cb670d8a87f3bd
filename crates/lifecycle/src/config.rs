//! Gate configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default interval between "still draining" warnings during a close.
pub const DEFAULT_DRAIN_WARN_AFTER: Duration = Duration::from_secs(30);

/// Configuration for a [`Gate`](crate::Gate)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GateConfig {
    /// Name used in log records, errors and leak reports
    pub name: String,
    /// How long a close may wait for outstanding holds before it logs a
    /// warning. The warning repeats at this interval; the close itself is
    /// never abandoned. `None` disables the warning.
    #[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
    pub drain_warn_after: Option<Duration>,
}

impl GateConfig {
    /// Config with the given name and default settings otherwise
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the drain warning interval
    pub fn with_drain_warn_after(mut self, interval: Duration) -> Self {
        self.drain_warn_after = Some(interval);
        self
    }

    /// Never warn about a slow drain
    pub fn without_drain_warning(mut self) -> Self {
        self.drain_warn_after = None;
        self
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: "resource".to_string(),
            drain_warn_after: Some(DEFAULT_DRAIN_WARN_AFTER),
        }
    }
}
