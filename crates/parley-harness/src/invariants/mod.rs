//! Session invariants.
//!
//! A check here states something that must hold after every processed
//! event, whatever order the network delivered things in. Scenario tests pin
//! down individual outcomes; these run underneath all of them.
//!
//! Each check sees a [`SessionSnapshot`]: the session's roster flags and,
//! when the simulation surface is attached, the roster as drawn. A check
//! failing on the drawn roster means a render command was lost or
//! misordered even though the session itself is sound.
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SessionSnapshot::from_session(&session).with_surface(&surface);
//! registry.assert_all(&snapshot, "after roster refresh");
//! ```

mod checks;
mod snapshot;

pub use checks::{SelectionMatchesSession, SingleSelection, UniquePeerIds, UnreadExcludesSelected};
pub use snapshot::{PeerSnapshot, SessionSnapshot};

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Check that failed.
    pub invariant: &'static str,
    /// Which view broke it and how.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of the session checked between events.
pub trait Invariant: Send + Sync {
    /// Stable name, used in violation reports.
    fn name(&self) -> &'static str;

    /// Check `state`.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Set of checks run together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry without checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every check in this module:
    ///
    /// - [`SingleSelection`]
    /// - [`SelectionMatchesSession`]
    /// - [`UniquePeerIds`]
    /// - [`UnreadExcludesSelected`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleSelection);
        registry.add(SelectionMatchesSession);
        registry.add(UniquePeerIds);
        registry.add(UnreadExcludesSelected);
        registry
    }

    /// Register `invariant`.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Names of the registered checks, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|invariant| invariant.name()).collect()
    }

    /// Run every check, collecting all failures.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> = self.invariants.iter().filter_map(|invariant| invariant.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic listing all failures, labelled with
    /// `context`.
    #[allow(clippy::panic, reason = "test-support assertion")]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        let Err(violations) = self.check_all(state) else {
            return;
        };
        let report: Vec<_> = violations.iter().map(ToString::to_string).collect();
        panic!("{} invariant(s) violated {context}:\n  {}", report.len(), report.join("\n  "));
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no check is registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
