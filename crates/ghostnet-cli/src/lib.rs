//! Command-line GhostNet node.
//!
//! Runs the ledger, coprocessor and gateway in one process over a data
//! directory, and drives them through [`ghostnet_client::GhostClient`] as a
//! named development identity.
//!
//! # Components
//!
//! - [`Node`]: opens the data directory and executes [`Command`]s
//! - [`dev_signing_key`]: deterministic signing keys for named identities
//! - [`NodeError`]: file, storage and client failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod node;

pub use error::NodeError;
pub use node::{Command, DATABASE_FILE, Node, SECRET_FILE, dev_signing_key};
