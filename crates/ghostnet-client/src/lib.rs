//! Client
//!
//! Orchestrates the GhostNet flows a user drives: generate a room key, create
//! a room with it encrypted, join, obtain the key through the reencryption
//! handshake, and exchange messages encrypted under it.
//!
//! # Components
//!
//! - [`GhostClient`]: one identity plus its cache of decrypted room keys
//! - [`ReadMessage`]: a log entry with its plaintext when the key is known
//! - [`ClientError`]: local validation failures and pass-through ledger errors
//!
//! The client is generic over [`ghostnet_core::GhostLedger`],
//! [`ghostnet_core::EncryptionCapability`] and
//! [`ghostnet_core::DecryptionOracle`], so it runs against an in-process
//! ledger in tests and in the command-line node alike.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{AUTHORIZATION_DAYS, GhostClient, ROOM_KEY_MAX, ROOM_KEY_MIN, ReadMessage};
pub use error::ClientError;
