//! Node error types.

use std::path::PathBuf;

use ghostnet_client::ClientError;
use ghostnet_core::GhostError;
use ghostnet_ledger::StorageError;
use thiserror::Error;

/// Errors from running node commands.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Reading or writing a file in the data directory failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored coprocessor secret has the wrong size.
    #[error("coprocessor key at {} must be 32 bytes, found {len}", path.display())]
    InvalidSecret {
        /// Key file
        path: PathBuf,
        /// Bytes found
        len: usize,
    },

    /// Ledger database could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Ledger call failed.
    #[error(transparent)]
    Ledger(#[from] GhostError),

    /// Client operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl NodeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
