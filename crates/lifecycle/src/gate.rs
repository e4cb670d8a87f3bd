//! Open/close gate in front of a shared resource.
//!
//! A [`Gate`] is created closed. While open, any number of threads can
//! [`acquire`](Gate::acquire) a [`Hold`]. [`close`](Gate::close) first
//! refuses new holds and fires every hold's closing signal, then blocks
//! until the outstanding holds have been released.
//!
//! Outstanding holds are counted by a reader/writer lock: every live hold
//! owns one shared claim, and the drain is an exclusive claim that only
//! succeeds once all of them are gone. The shared claim is taken inside the
//! state lock, before the open flag is read, so no hold observed as granted
//! can slip past a drain that has already started.

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use parking_lot::lock_api::{RawRwLock as RawRwLockApi, RawRwLockTimed};
use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::error::{Error, Result};
use crate::hold::Hold;
use crate::registry::{HoldMeta, LeakRegistry, NoopRegistry};

/// State shared between a gate and the holds it granted.
pub(crate) struct Shared<R> {
    pub(crate) name: Arc<str>,
    drain_warn_after: Option<Duration>,
    /// `Some` exactly while open; cancelled when a close begins.
    signal: Mutex<Option<CancellationToken>>,
    /// Mirrors `signal.is_some()`; read without the state lock.
    open: AtomicBool,
    /// One shared claim per live hold, exclusive while draining.
    holds: parking_lot::RawRwLock,
    /// Set while an open/close call is running.
    controller: AtomicBool,
    pub(crate) registry: R,
}

impl<R: LeakRegistry> Shared<R> {
    /// Give back the shared claim taken by a successful `acquire`.
    ///
    /// # Safety
    ///
    /// Must be called at most once per successful `acquire`.
    pub(crate) unsafe fn release_claim(&self) {
        // SAFETY: the caller owns one shared claim taken in `Gate::acquire`;
        // `send_guard` lets it be released from any thread.
        unsafe { self.holds.unlock_shared() };
    }

    fn enter_controller(&self, op: &'static str) -> ControllerScope<'_> {
        let busy = self.controller.swap(true, Ordering::AcqRel);
        debug_assert!(
            !busy,
            "Gate::{op} on '{}' raced another open/close call",
            self.name
        );
        ControllerScope(&self.controller)
    }
}

/// Clears the controller-busy flag on scope exit.
struct ControllerScope<'a>(&'a AtomicBool);

impl Drop for ControllerScope<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lifecycle gate for one shared resource.
///
/// Cloning is cheap; clones control the same gate. `open` and `close` must
/// be called by one controller at a time (debug builds assert this).
/// `is_open`, `acquire` and hold release may run from any number of threads
/// in any state.
///
/// ```
/// use nebula_lifecycle::{Gate, GateConfig};
///
/// let gate = Gate::new(GateConfig::named("postgres"));
/// assert!(gate.acquire().is_err());
///
/// gate.open();
/// let hold = gate.acquire().unwrap();
/// assert!(!hold.closing_signal().is_closing());
/// hold.release();
///
/// gate.close();
/// assert!(gate.acquire().is_err());
/// ```
pub struct Gate<R: LeakRegistry = NoopRegistry> {
    shared: Arc<Shared<R>>,
}

impl Gate {
    /// Create a closed gate without leak tracking
    pub fn new(config: GateConfig) -> Self {
        Self::with_registry(config, NoopRegistry)
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl<R: LeakRegistry> Gate<R> {
    /// Create a closed gate that reports holds to `registry`
    pub fn with_registry(config: GateConfig, registry: R) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: Arc::from(config.name),
                drain_warn_after: config.drain_warn_after,
                signal: Mutex::new(None),
                open: AtomicBool::new(false),
                holds: <parking_lot::RawRwLock as RawRwLockApi>::INIT,
                controller: AtomicBool::new(false),
                registry,
            }),
        }
    }

    /// Gate name from its config
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Registry this gate reports holds to
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.shared.registry
    }

    /// Open the gate so that `acquire` succeeds.
    ///
    /// Opening an already open gate keeps the current generation, so holds
    /// granted before still see the next close.
    pub fn open(&self) {
        let _scope = self.shared.enter_controller("open");
        let mut signal = self.shared.signal.lock();
        if signal.is_some() {
            tracing::debug!(gate = %self.shared.name, "gate already open");
            return;
        }
        *signal = Some(CancellationToken::new());
        self.shared.open.store(true, Ordering::Release);
        tracing::debug!(gate = %self.shared.name, "gate opened");
    }

    /// Close the gate and wait for every outstanding hold to be released.
    ///
    /// New `acquire` calls fail as soon as this starts. Blocks for as long
    /// as any hold is live; there is no timeout. Closing a closed gate
    /// returns once any stragglers from the last generation are gone.
    pub fn close(&self) {
        let _scope = self.shared.enter_controller("close");

        let signal = {
            let mut slot = self.shared.signal.lock();
            self.shared.open.store(false, Ordering::Release);
            slot.take()
        };
        if let Some(signal) = signal {
            signal.cancel();
            tracing::debug!(gate = %self.shared.name, "gate closing");
        }

        let started = Instant::now();
        self.drain(started);
        // SAFETY: `drain` returned holding the exclusive claim.
        unsafe { self.shared.holds.unlock_exclusive() };

        tracing::debug!(
            gate = %self.shared.name,
            elapsed = ?started.elapsed(),
            "gate closed"
        );
    }

    /// Take the exclusive claim, warning periodically while holds remain.
    fn drain(&self, started: Instant) {
        let Some(interval) = self.shared.drain_warn_after else {
            self.shared.holds.lock_exclusive();
            return;
        };
        while !self.shared.holds.try_lock_exclusive_for(interval) {
            tracing::warn!(
                gate = %self.shared.name,
                elapsed = ?started.elapsed(),
                "close still waiting for outstanding holds"
            );
        }
    }

    /// Whether the gate is currently open.
    ///
    /// A point-in-time answer that never blocks, even while a close is
    /// draining. Only `acquire` decides whether a hold is granted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Take a hold on the resource.
    ///
    /// Fails with [`Error::ResourceClosed`] if the gate is not open. While a
    /// close is draining this waits for the drain to finish and then fails,
    /// so a thread must not call it while itself keeping a hold that the
    /// drain is waiting on.
    #[track_caller]
    pub fn acquire(&self) -> Result<Hold<R>> {
        let site = Location::caller();
        let shared = &self.shared;

        let signal = shared.signal.lock();
        shared.holds.lock_shared();
        let Some(closing) = signal.as_ref().cloned() else {
            drop(signal);
            // SAFETY: the shared claim was taken just above and no hold owns it.
            unsafe { shared.release_claim() };
            tracing::trace!(gate = %shared.name, %site, "acquire refused, gate closed");
            return Err(Error::resource_closed(Arc::clone(&shared.name)));
        };
        drop(signal);

        let token = shared.registry.track(HoldMeta {
            gate: &shared.name,
            site,
        });
        tracing::trace!(gate = %shared.name, %site, "hold acquired");
        Ok(Hold::new(Arc::clone(shared), closing, token))
    }
}

impl<R: LeakRegistry> Clone for Gate<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: LeakRegistry> std::fmt::Debug for Gate<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}
