//! Deterministic simulation harness for GhostNet ledger testing.
//!
//! [`SimEnv`] replaces wall-clock time and OS randomness with a virtual clock
//! and a seeded RNG, so every handle, identity and timestamp is reproducible
//! from a single seed.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation. Operations are
//! applied to both [`ModelLedger`] and [`SimLedger`] and their results and
//! observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of persisted state after every
//! step. Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod model;
pub mod sim_env;
pub mod sim_ledger;

pub use invariants::{
    CreatorIsMember, DenseRoomIds, Invariant, InvariantRegistry, InvariantResult, LedgerSnapshot,
    MemberCountMatchesAcl, RoomSnapshot, SendersAreMembers, UniqueHandles, Violation,
};
pub use model::{
    ActorId, ModelLedger, ModelMessage, ModelRoomId, ObservableState, Operation, OperationError,
    OperationResult, SmallMessage,
};
pub use sim_env::{SIM_EPOCH_SECS, SimEnv};
pub use sim_ledger::{SimActor, SimLedger};
