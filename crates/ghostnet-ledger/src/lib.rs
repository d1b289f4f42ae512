//! GhostNet ledger.
//!
//! Shared, serialized state for encrypted group rooms: who created which
//! room, who may decrypt its key, and the ciphertexts posted to it.
//!
//! # Components
//!
//! - [`RoomRegistry`]: dense room ids and public room records
//! - [`MembershipGate`]: join and membership queries
//! - [`KeyStore`]: one encrypted key per room plus its access list
//! - [`MessageLedger`]: append-only ciphertext log per room
//! - [`GhostNet`]: the [`ghostnet_core::GhostLedger`] built from the above
//! - [`Gateway`]: the [`ghostnet_core::DecryptionOracle`] that releases room
//!   keys to members
//! - [`SystemEnv`]: Production environment (real time, crypto RNG)
//!
//! Persistence goes through the synchronous [`Storage`] trait, with an
//! in-memory backend for tests and a redb backend for the node.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod key_store;
mod ledger;
mod membership;
mod messages;
mod oracle;
mod registry;
pub mod storage;
mod system_env;

pub use config::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_MAX_DURATION_DAYS, GatewayConfig, LedgerConfig};
pub use key_store::KeyStore;
pub use ledger::GhostNet;
pub use membership::MembershipGate;
pub use messages::MessageLedger;
pub use oracle::Gateway;
pub use registry::RoomRegistry;
pub use storage::{ChaoticStorage, MemoryStorage, RedbStorage, Storage, StorageError};
pub use system_env::SystemEnv;
