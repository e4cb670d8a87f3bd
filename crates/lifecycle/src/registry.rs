//! Leak detection for holds that are never released.
//!
//! Every successful [`Gate::acquire`](crate::Gate::acquire) calls
//! [`LeakRegistry::track`], and the first release of that hold calls
//! [`LeakRegistry::untrack`]. The default [`NoopRegistry`] compiles both
//! away. [`LiveRegistry`] keeps a table of live holds that tests and debug
//! builds can inspect when a close hangs or at shutdown.

use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// What the gate knows about a hold at the moment it is granted.
#[derive(Debug, Clone, Copy)]
pub struct HoldMeta<'a> {
    /// Name of the granting gate
    pub gate: &'a Arc<str>,
    /// Call site of the `acquire` that produced the hold
    pub site: &'static Location<'static>,
}

/// Collaborator notified about every hold's birth and release.
pub trait LeakRegistry: Send + Sync + 'static {
    /// Handle returned by `track` and handed back to `untrack`.
    type Token: Send + Sync + 'static;

    /// Record a newly granted hold.
    fn track(&self, meta: HoldMeta<'_>) -> Self::Token;

    /// Forget a hold. Called exactly once per token.
    fn untrack(&self, token: &Self::Token);
}

/// Registry that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

impl LeakRegistry for NoopRegistry {
    type Token = ();

    #[inline]
    fn track(&self, _meta: HoldMeta<'_>) {}

    #[inline]
    fn untrack(&self, _token: &()) {}
}

impl<R: LeakRegistry + ?Sized> LeakRegistry for &'static R {
    type Token = R::Token;

    fn track(&self, meta: HoldMeta<'_>) -> Self::Token {
        (**self).track(meta)
    }

    fn untrack(&self, token: &Self::Token) {
        (**self).untrack(token);
    }
}

impl<R: LeakRegistry + ?Sized> LeakRegistry for Arc<R> {
    type Token = R::Token;

    fn track(&self, meta: HoldMeta<'_>) -> Self::Token {
        (**self).track(meta)
    }

    fn untrack(&self, token: &Self::Token) {
        (**self).untrack(token);
    }
}

/// Identity of a hold inside a [`LiveRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HoldId(u64);

impl HoldId {
    /// Raw numeric id
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HoldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hold-{}", self.0)
    }
}

/// A live hold as seen by [`LiveRegistry`].
#[derive(Debug, Clone)]
pub struct HoldRecord {
    /// Registry-assigned identity
    pub id: HoldId,
    /// Name of the gate that granted the hold
    pub gate: Arc<str>,
    /// Where `acquire` was called
    pub site: &'static Location<'static>,
    /// When the hold was granted
    pub acquired_at: Instant,
    /// Name of the acquiring thread, if it had one
    pub thread: Option<String>,
}

impl HoldRecord {
    /// How long the hold has been outstanding
    #[must_use]
    pub fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

static GLOBAL: LazyLock<LiveRegistry> = LazyLock::new(LiveRegistry::new);

/// Registry that keeps every live hold in a concurrent table.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    next_id: AtomicU64,
    live: DashMap<HoldId, HoldRecord>,
}

impl LiveRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every gate built with it.
    ///
    /// ```
    /// use nebula_lifecycle::{Gate, GateConfig, LiveRegistry};
    ///
    /// let gate = Gate::with_registry(GateConfig::named("doc-global"), LiveRegistry::global());
    /// gate.open();
    /// let hold = gate.acquire().unwrap();
    /// assert_eq!(LiveRegistry::global().live_on("doc-global").len(), 1);
    /// drop(hold);
    /// assert!(LiveRegistry::global().live_on("doc-global").is_empty());
    /// ```
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Snapshot of every live hold, oldest first
    #[must_use]
    pub fn live(&self) -> Vec<HoldRecord> {
        let mut records: Vec<HoldRecord> =
            self.live.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Snapshot of the live holds granted by the named gate, oldest first
    #[must_use]
    pub fn live_on(&self, gate: &str) -> Vec<HoldRecord> {
        let mut records: Vec<HoldRecord> = self
            .live
            .iter()
            .filter(|entry| &*entry.value().gate == gate)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Number of live holds
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no hold is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Log every live hold at `warn` level and return how many there were.
    pub fn log_live(&self) -> usize {
        let records = self.live();
        for record in &records {
            tracing::warn!(
                hold = %record.id,
                gate = %record.gate,
                site = %record.site,
                thread = record.thread.as_deref().unwrap_or("<unnamed>"),
                age = ?record.age(),
                "hold not released"
            );
        }
        records.len()
    }
}

impl LeakRegistry for LiveRegistry {
    type Token = HoldId;

    fn track(&self, meta: HoldMeta<'_>) -> HoldId {
        let id = HoldId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.insert(
            id,
            HoldRecord {
                id,
                gate: Arc::clone(meta.gate),
                site: meta.site,
                acquired_at: Instant::now(),
                thread: std::thread::current().name().map(str::to_owned),
            },
        );
        id
    }

    fn untrack(&self, token: &HoldId) {
        self.live.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(gate: &Arc<str>) -> HoldMeta<'_> {
        HoldMeta {
            gate,
            site: Location::caller(),
        }
    }

    #[test]
    fn live_registry_tracks_and_untracks() {
        let registry = LiveRegistry::new();
        let gate: Arc<str> = Arc::from("db");

        let a = registry.track(meta(&gate));
        let b = registry.track(meta(&gate));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.untrack(&a);
        let live = registry.live();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, b);
        assert_eq!(&*live[0].gate, "db");

        registry.untrack(&b);
        assert!(registry.is_empty());
    }

    #[test]
    fn live_on_filters_by_gate() {
        let registry = LiveRegistry::new();
        let db: Arc<str> = Arc::from("db");
        let cache: Arc<str> = Arc::from("cache");

        let _db_hold = registry.track(meta(&db));
        let cache_hold = registry.track(meta(&cache));

        let cached = registry.live_on("cache");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, cache_hold);
        assert!(registry.live_on("queue").is_empty());
    }

    #[test]
    fn records_thread_name() {
        let registry = Arc::new(LiveRegistry::new());
        let gate: Arc<str> = Arc::from("named");
        let worker = {
            let registry = Arc::clone(&registry);
            std::thread::Builder::new()
                .name("worker-7".into())
                .spawn(move || registry.track(meta(&gate)))
                .unwrap()
        };
        let id = worker.join().unwrap();
        let record = registry.live().pop().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.thread.as_deref(), Some("worker-7"));
    }

    #[test]
    fn log_live_counts_outstanding() {
        let registry = LiveRegistry::new();
        let gate: Arc<str> = Arc::from("db");
        let _first = registry.track(meta(&gate));
        assert_eq!(registry.log_live(), 1);
    }

    #[test]
    fn hold_id_display() {
        assert_eq!(HoldId(3).to_string(), "hold-3");
        assert_eq!(HoldId(3).get(), 3);
    }
}
