//! Deterministic simulation harness for Parley session testing.
//!
//! [`SimDriver`] implements the [`parley_app::Driver`] trait over a scripted
//! directory, a recording channel and an in-memory render surface, so the
//! real [`parley_app::Runtime`] runs unchanged in tests. Directory answers
//! can be held back and released in any order to exercise interleavings.
//!
//! With [`SimDriver::with_invariants`] every poll first checks the session
//! and the drawn roster against an [`InvariantRegistry`], so any test that
//! pumps the runtime also checks selection and unread consistency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod surface;

pub use invariants::{
    Invariant, InvariantResult, InvariantRegistry, PeerSnapshot, SelectionMatchesSession,
    SessionSnapshot, SingleSelection, UniquePeerIds, UnreadExcludesSelected, Violation,
};
pub use sim_driver::{SimDirectory, SimDriver, SimDriverError};
pub use surface::{SimSurface, SurfaceEntry};
