//! Error types for GhostNet cryptography.

use thiserror::Error;

/// Errors from the message cipher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Key was empty.
    #[error("missing key")]
    MissingKey,
}

/// Errors from the handshake and coprocessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signer key bytes are not a valid Ed25519 point.
    #[error("invalid signer key")]
    InvalidSignerKey,

    /// Signature does not verify.
    #[error("signature verification failed")]
    BadSignature,

    /// Key agreement produced a non-contributory shared secret.
    #[error("degenerate ephemeral public key")]
    DegenerateKey,

    /// Handle bytes do not have the expected layout.
    #[error("malformed handle: expected {expected} bytes, got {actual}")]
    MalformedHandle {
        /// Expected handle length
        expected: usize,
        /// Actual handle length
        actual: usize,
    },

    /// AEAD authentication failed.
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// What was being decrypted
        reason: String,
    },
}
