//! Handles and proofs produced by the confidential-computation capability.
//!
//! The ledger never interprets these bytes. It stores a [`KeyHandle`] per
//! room and asks an [`InputVerifier`] whether the accompanying
//! [`InputProof`] binds the handle to the caller and this contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::GhostError,
    identity::{ContractAddress, Identity},
};

/// Opaque reference to an encrypted 32-bit value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyHandle(Vec<u8>);

impl KeyHandle {
    /// Wrap raw handle bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw handle bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHandle({self})")
    }
}

/// Proof that a handle is a well-formed input from a given caller.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(Vec<u8>);

impl InputProof {
    /// Wrap raw proof bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw proof bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for InputProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputProof({} bytes)", self.0.len())
    }
}

/// Output of [`EncryptionCapability::encrypt_input`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    /// Handle to submit with the ledger call
    pub handle: KeyHandle,
    /// Proof binding the handle to the caller and contract
    pub proof: InputProof,
}

/// Client-side capability that encrypts plaintext integers.
pub trait EncryptionCapability {
    /// Encrypt `value` for use by `caller` in calls to `context`.
    ///
    /// The resulting handle is only accepted by the ledger at `context` when
    /// submitted by `caller`.
    fn encrypt_input(
        &self,
        context: ContractAddress,
        caller: Identity,
        value: u32,
    ) -> EncryptedInput;
}

/// Ledger-side check of encrypted inputs.
pub trait InputVerifier {
    /// Verify that `proof` binds `handle` to `caller` and `context`.
    ///
    /// # Errors
    ///
    /// - `GhostError::InvalidProof` if the proof does not verify
    fn verify_input(
        &self,
        context: ContractAddress,
        caller: Identity,
        handle: &KeyHandle,
        proof: &InputProof,
    ) -> Result<(), GhostError>;
}
