//! Reencryption handshake messages.
//!
//! A member proves it wants a room key by signing a time-bounded statement
//! naming an ephemeral public key. The oracle checks the statement against
//! the key store's access list and answers with the plaintext sealed to that
//! ephemeral key, so nobody but the requester can read the reply.
//!
//! ```text
//! client                                    oracle
//!   │ ephemeral X25519 keypair                 │
//!   │ DecryptAuthorization ─sign(Ed25519)─►    │
//!   │ UserDecryptRequest ─────────────────────►│ verify sig, window, ACL
//!   │◄──────────────────────── SealedPlaintext │ seal(plaintext, eph_pk)
//!   │ open(eph_sk)                             │
//! ```

use sha2::{Digest, Sha256};

use crate::{
    error::GhostError,
    fhe::KeyHandle,
    identity::{ContractAddress, Identity},
};

/// Domain separator for authorization signatures.
///
/// Keeps a signature over this statement from being valid for any other
/// message type signed with the same identity key.
pub const AUTHORIZATION_DOMAIN: &[u8] = b"GhostNet UserDecryptRequestVerification v1";

/// Seconds in one authorization day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Statement a member signs to request decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptAuthorization {
    /// X25519 public key the reply is sealed to
    pub ephemeral_public_key: [u8; 32],
    /// Contracts whose handles this authorization covers
    pub contract_addresses: Vec<ContractAddress>,
    /// First second the authorization is valid
    pub start_timestamp: u64,
    /// Validity window length in days
    pub duration_days: u64,
}

impl DecryptAuthorization {
    /// Digest that is signed.
    ///
    /// SHA-256 over the domain separator followed by each field. The
    /// contract list is length-prefixed so no two statements share an
    /// encoding.
    pub fn signing_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(AUTHORIZATION_DOMAIN);
        hasher.update(self.ephemeral_public_key);
        hasher.update((self.contract_addresses.len() as u32).to_be_bytes());
        for address in &self.contract_addresses {
            hasher.update(address.as_bytes());
        }
        hasher.update(self.start_timestamp.to_be_bytes());
        hasher.update(self.duration_days.to_be_bytes());
        hasher.finalize().into()
    }

    /// First second after the validity window.
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp.saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    /// Whether `contract` is listed in the statement.
    pub fn covers(&self, contract: ContractAddress) -> bool {
        self.contract_addresses.contains(&contract)
    }
}

/// A statement together with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthorization {
    /// The signed statement
    pub statement: DecryptAuthorization,
    /// Ed25519 verifying key of the signer
    pub signer_key: [u8; 32],
    /// Ed25519 signature over [`DecryptAuthorization::signing_digest`]
    pub signature: [u8; 64],
}

/// Request submitted to the decryption oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecryptRequest {
    /// Handle to decrypt
    pub handle: KeyHandle,
    /// Signed authorization from the requester
    pub authorization: SignedAuthorization,
    /// Identity asking for the plaintext
    pub requester: Identity,
}

/// Plaintext sealed to a requester's ephemeral key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPlaintext {
    /// Oracle's one-time X25519 public key
    pub oracle_public_key: [u8; 32],
    /// `XChaCha20` nonce
    pub nonce: [u8; 24],
    /// Sealed value including the Poly1305 tag
    pub ciphertext: Vec<u8>,
}

/// Decrypts handles for authorized requesters.
pub trait DecryptionOracle {
    /// Decrypt the handle in `request` and seal the plaintext to the
    /// requester's ephemeral key.
    ///
    /// # Errors
    ///
    /// - `GhostError::UnknownHandle` if the handle backs no room
    /// - `GhostError::AuthorizationDenied` if the signature, validity window,
    ///   contract list or access list check fails
    fn user_decrypt(&self, request: &UserDecryptRequest) -> Result<SealedPlaintext, GhostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement() -> DecryptAuthorization {
        DecryptAuthorization {
            ephemeral_public_key: [3u8; 32],
            contract_addresses: vec![ContractAddress::from_bytes([1u8; 20])],
            start_timestamp: 1_700_000_000,
            duration_days: 10,
        }
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(statement().signing_digest(), statement().signing_digest());
    }

    #[test]
    fn digest_binds_every_field() {
        let base = statement().signing_digest();

        let mut changed = statement();
        changed.ephemeral_public_key[0] ^= 1;
        assert_ne!(changed.signing_digest(), base);

        let mut changed = statement();
        changed.contract_addresses.push(ContractAddress::from_bytes([2u8; 20]));
        assert_ne!(changed.signing_digest(), base);

        let mut changed = statement();
        changed.start_timestamp += 1;
        assert_ne!(changed.signing_digest(), base);

        let mut changed = statement();
        changed.duration_days += 1;
        assert_ne!(changed.signing_digest(), base);
    }

    #[test]
    fn expiry_is_start_plus_days() {
        assert_eq!(statement().expires_at(), 1_700_000_000 + 10 * SECONDS_PER_DAY);
    }

    #[test]
    fn covers_only_listed_contracts() {
        assert!(statement().covers(ContractAddress::from_bytes([1u8; 20])));
        assert!(!statement().covers(ContractAddress::from_bytes([2u8; 20])));
    }
}
