//! # Nebula Lifecycle
//!
//! Open/close gate for a shared resource (a connection, a file handle, a
//! subsystem). Workers take short-lived [`Hold`]s while the gate is open;
//! a controller closes the gate, which refuses new holds, signals the
//! outstanding ones and waits until every one has been released.
//!
//! ```
//! use nebula_lifecycle::{Gate, GateConfig};
//!
//! let gate = Gate::new(GateConfig::named("smtp"));
//! gate.open();
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let hold = gate.acquire().unwrap();
//!         std::thread::spawn(move || {
//!             // use the resource, then give the hold back
//!             hold.release();
//!         })
//!     })
//!     .collect();
//!
//! gate.close(); // returns once all four holds are released
//! assert!(gate.acquire().is_err());
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! ```
//!
//! Leak tracking is opt-in: build the gate with a [`LiveRegistry`] to see
//! which holds are still live and where they were acquired.

// Hold claims on the gate's reader/writer lock outlive any guard.
#![allow(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod group;
pub mod hold;
pub mod registry;
pub mod signal;

pub use config::GateConfig;
pub use error::{Error, Result};
pub use gate::Gate;
pub use group::HoldGroup;
pub use hold::Hold;
pub use registry::{HoldId, HoldMeta, HoldRecord, LeakRegistry, LiveRegistry, NoopRegistry};
pub use signal::Closing;
