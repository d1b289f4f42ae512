//! GhostNet cryptographic primitives.
//!
//! Three independent pieces:
//!
//! - [`cipher`]: the XOR message cipher clients use with a decrypted room key.
//!   It is an obfuscation layer for ledger storage, not a confidentiality
//!   mechanism.
//! - [`handshake`]: ephemeral keys, authorization signatures and the sealed
//!   reply of the reencryption handshake.
//! - [`coprocessor`]: a deterministic stand-in for the FHE capability that
//!   produces key handles and input proofs.
//!
//! Functions that need randomness take it as an argument. Only
//! [`Coprocessor`] pulls bytes from an [`ghostnet_core::Environment`].
//!
//! # Key Lifecycle
//!
//! ```text
//! room key (u32) ──Coprocessor──► KeyHandle + InputProof ──► ledger
//!                                     │
//!                 oracle: decrypt ◄───┘
//!                     │
//!                     ▼
//!         seal to ephemeral X25519 key ──► client opens
//!                     │
//!                     ▼
//!         decimal string ──XOR──► message ciphertext
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod coprocessor;
mod error;
pub mod handshake;

pub use cipher::{decrypt, encrypt};
pub use coprocessor::{Coprocessor, HANDLE_LEN};
pub use error::{CipherError, CryptoError};
pub use handshake::{
    EphemeralKeypair, open_sealed, seal_plaintext, sign_authorization, verify_authorization,
};
