//! Client error types.

use ghostnet_core::{GhostError, RoomId};
use ghostnet_crypto::{CipherError, CryptoError};
use thiserror::Error;

/// Errors from client operations.
///
/// Everything except [`ClientError::Ledger`] is detected locally, before any
/// ledger call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The ledger or the decryption oracle rejected the call.
    #[error(transparent)]
    Ledger(#[from] GhostError),

    /// Message cipher failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Handshake reply could not be opened.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Room name is empty or whitespace.
    #[error("room name is required")]
    BlankName,

    /// Room key outside the 6 to 8 digit range.
    #[error("room key {0} is not a 6-8 digit number")]
    InvalidRoomKey(u32),

    /// Message is empty or whitespace.
    #[error("message is empty")]
    BlankMessage,

    /// No decrypted key cached for the room.
    #[error("no key for room {0}; decrypt the room key first")]
    MissingKey(RoomId),
}
