//! Holds: proof that a gate was open, released exactly once

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio_util::sync::CancellationToken;

use crate::gate::Shared;
use crate::registry::{LeakRegistry, NoopRegistry};
use crate::signal::Closing;

/// One outstanding access to a gated resource.
///
/// Returned by [`Gate::acquire`](crate::Gate::acquire). The gate cannot
/// finish closing while the hold is live. Releasing is idempotent and safe
/// from any thread: [`release`](Self::release) can be called through a
/// shared reference any number of times, and dropping the hold releases it
/// too.
pub struct Hold<R: LeakRegistry = NoopRegistry> {
    /// Cleared by the one release that wins.
    gate: ArcSwapOption<Shared<R>>,
    name: Arc<str>,
    closing: CancellationToken,
    token: R::Token,
}

impl<R: LeakRegistry> Hold<R> {
    pub(crate) fn new(gate: Arc<Shared<R>>, closing: CancellationToken, token: R::Token) -> Self {
        Self {
            name: Arc::clone(&gate.name),
            gate: ArcSwapOption::new(Some(gate)),
            closing,
            token,
        }
    }

    /// Release the hold.
    ///
    /// Only the first call, across all threads, untracks the hold and gives
    /// its claim back to the gate. Every other call is a no-op.
    pub fn release(&self) {
        let Some(gate) = self.gate.swap(None) else {
            return;
        };
        gate.registry.untrack(&self.token);
        // SAFETY: this hold was granted exactly one shared claim and the swap
        // above lets only one caller reach this point.
        unsafe { gate.release_claim() };
        tracing::trace!(gate = %self.name, "hold released");
    }

    /// Whether the hold has been released
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.gate.load().is_none()
    }

    /// Signal that fires when the granting gate starts closing.
    ///
    /// Fired from the start if this hold is already released.
    #[must_use]
    pub fn closing_signal(&self) -> Closing {
        if self.is_released() {
            Closing::fired()
        } else {
            Closing::watching(self.closing.clone())
        }
    }

    /// Name of the granting gate
    #[must_use]
    pub fn gate_name(&self) -> &str {
        &self.name
    }

    /// Registry token this hold was tracked under
    #[must_use]
    pub fn token(&self) -> &R::Token {
        &self.token
    }
}

impl<R: LeakRegistry> Drop for Hold<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: LeakRegistry> std::fmt::Debug for Hold<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hold")
            .field("gate", &self.name)
            .field("released", &self.is_released())
            .finish()
    }
}
