//! GhostNet core types.
//!
//! Shared vocabulary for the encrypted-room ledger: identities, rooms,
//! messages, events, the FHE handle types and the traits that separate the
//! ledger from its external collaborators.
//!
//! # Architecture
//!
//! ```text
//!   GhostClient ──create/join/send──► GhostLedger ──verify──► InputVerifier
//!        │                                 │
//!        └──user_decrypt──► DecryptionOracle ──ACL──┘
//! ```
//!
//! Nothing in this crate performs I/O. Time and randomness come from an
//! [`env::Environment`] so ledger logic runs unchanged under simulation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod authorization;
pub mod env;
pub mod error;
pub mod event;
pub mod fhe;
pub mod identity;
pub mod ledger;
pub mod room;

pub use authorization::{
    DecryptAuthorization, DecryptionOracle, SealedPlaintext, SignedAuthorization,
    UserDecryptRequest,
};
pub use env::Environment;
pub use error::{DenialReason, GhostError};
pub use event::{LedgerEvent, Receipt};
pub use fhe::{EncryptedInput, EncryptionCapability, InputProof, InputVerifier, KeyHandle};
pub use identity::{ContractAddress, Identity};
pub use ledger::GhostLedger;
pub use room::{Message, Room, RoomId};
