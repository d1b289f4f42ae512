//! Identities and contract addresses.
//!
//! An [`Identity`] is a 20-byte address derived from an Ed25519 verifying
//! key. The ledger only ever sees addresses; the verifying key travels with
//! signed authorizations so the oracle can check the derivation.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain separator for identity derivation
const IDENTITY_LABEL: &[u8] = b"ghostnet/identity/v1";

/// Address length in bytes
pub const ADDRESS_LEN: usize = 20;

/// A caller on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity([u8; ADDRESS_LEN]);

impl Identity {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the address for an Ed25519 verifying key.
    ///
    /// First 20 bytes of `SHA-256(label || key)`.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(IDENTITY_LABEL);
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

/// The ledger context that handles and authorizations are bound to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractAddress([u8; ADDRESS_LEN]);

impl ContractAddress {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({self})")
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let key = SigningKey::from_bytes(&[9u8; 32]).verifying_key();
        assert_eq!(Identity::from_verifying_key(&key), Identity::from_verifying_key(&key));
    }

    #[test]
    fn distinct_keys_give_distinct_identities() {
        let a = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        let b = SigningKey::from_bytes(&[2u8; 32]).verifying_key();
        assert_ne!(Identity::from_verifying_key(&a), Identity::from_verifying_key(&b));
    }

    #[test]
    fn display_is_prefixed_hex() {
        let identity = Identity::from_bytes([0xab; 20]);
        insta::assert_snapshot!(
            identity.to_string(),
            @"0xabababababababababababababababababababab"
        );
    }
}
