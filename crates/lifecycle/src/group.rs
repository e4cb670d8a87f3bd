//! Release several holds with one call

use crate::hold::Hold;
use crate::registry::{LeakRegistry, NoopRegistry};

/// A batch of holds released together.
///
/// Collecting acquisitions into a group releases the ones already taken if
/// a later acquire fails:
///
/// ```
/// use nebula_lifecycle::{Gate, GateConfig, HoldGroup, Result};
///
/// let primary = Gate::new(GateConfig::named("primary"));
/// let replica = Gate::new(GateConfig::named("replica"));
/// primary.open();
///
/// let group: Result<HoldGroup> = [&primary, &replica]
///     .into_iter()
///     .map(|gate| gate.acquire())
///     .collect();
/// assert!(group.is_err());
///
/// // the primary hold was dropped with the partial group
/// primary.close();
/// ```
pub struct HoldGroup<R: LeakRegistry = NoopRegistry> {
    holds: Vec<Hold<R>>,
}

impl<R: LeakRegistry> HoldGroup<R> {
    /// Create an empty group
    #[must_use]
    pub fn new() -> Self {
        Self { holds: Vec::new() }
    }

    /// Create an empty group with room for `capacity` holds
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            holds: Vec::with_capacity(capacity),
        }
    }

    /// Add a hold to the group
    pub fn push(&mut self, hold: Hold<R>) {
        self.holds.push(hold);
    }

    /// Number of holds in the group, released or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.holds.len()
    }

    /// Whether the group has no holds
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    /// Iterate over the member holds
    pub fn iter(&self) -> std::slice::Iter<'_, Hold<R>> {
        self.holds.iter()
    }

    /// Release every member. Safe to call any number of times.
    pub fn release(&self) {
        for hold in &self.holds {
            hold.release();
        }
    }

    /// Whether every member has been released
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.holds.iter().all(Hold::is_released)
    }
}

impl<R: LeakRegistry> Default for HoldGroup<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: LeakRegistry> From<Vec<Hold<R>>> for HoldGroup<R> {
    fn from(holds: Vec<Hold<R>>) -> Self {
        Self { holds }
    }
}

impl<R: LeakRegistry> FromIterator<Hold<R>> for HoldGroup<R> {
    fn from_iter<I: IntoIterator<Item = Hold<R>>>(iter: I) -> Self {
        Self {
            holds: iter.into_iter().collect(),
        }
    }
}

impl<R: LeakRegistry> Extend<Hold<R>> for HoldGroup<R> {
    fn extend<I: IntoIterator<Item = Hold<R>>>(&mut self, iter: I) {
        self.holds.extend(iter);
    }
}

impl<'a, R: LeakRegistry> IntoIterator for &'a HoldGroup<R> {
    type Item = &'a Hold<R>;
    type IntoIter = std::slice::Iter<'a, Hold<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.holds.iter()
    }
}

impl<R: LeakRegistry> std::fmt::Debug for HoldGroup<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.holds).finish()
    }
}
