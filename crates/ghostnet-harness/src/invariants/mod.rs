//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties of persisted ledger state that must hold after
//! every operation, successful or not. A failed operation that leaves a
//! half-written room or a stale member count is caught here even when its
//! error result matched the model.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = LedgerSnapshot::capture(&storage)?;
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    CreatorIsMember, DenseRoomIds, MemberCountMatchesAcl, SendersAreMembers, UniqueHandles,
};
pub use snapshot::{LedgerSnapshot, RoomSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against ledger state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &LedgerSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every ledger invariant.
    ///
    /// Includes:
    /// - [`DenseRoomIds`]: ids are `1..=room_count`
    /// - [`MemberCountMatchesAcl`]: counts agree with access lists
    /// - [`CreatorIsMember`]: creators are always authorized
    /// - [`UniqueHandles`]: one room per key handle
    /// - [`SendersAreMembers`]: every logged sender is authorized
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(DenseRoomIds);
        registry.add(MemberCountMatchesAcl);
        registry.add(CreatorIsMember);
        registry.add(UniqueHandles);
        registry.add(SendersAreMembers);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &LedgerSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &LedgerSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&LedgerSnapshot::empty()).is_ok());
    }

    #[test]
    fn assert_all_accepts_consistent_state() {
        InvariantRegistry::standard().assert_all(&LedgerSnapshot::empty(), "initial state");
    }

    #[test]
    #[should_panic(expected = "Invariant violation after step 3")]
    fn assert_all_reports_context() {
        let phantom_room = LedgerSnapshot { room_count: 1, rooms: Vec::new() };
        InvariantRegistry::standard().assert_all(&phantom_room, "after step 3");
    }
}
