//! Deterministic stand-in for the FHE coprocessor.
//!
//! Produces opaque key handles and input proofs with the same contract as the
//! real capability: a handle is bound to one contract, its proof is bound to
//! one caller, and only the holder of the coprocessor secret can recover the
//! plaintext.
//!
//! Handle layout (44 bytes):
//!
//! ```text
//! ┌───────────┬──────────────────────────────┐
//! │ nonce(24) │ XChaCha20-Poly1305(u32 LE)   │  aad = contract address
//! └───────────┴──────────────────────────────┘
//! ```
//!
//! Proof: `HMAC-SHA256(k_mac, label || contract || caller || handle)`.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use ghostnet_core::{
    ContractAddress, EncryptedInput, EncryptionCapability, Environment, GhostError, Identity,
    InputProof, InputVerifier, KeyHandle,
};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Nonce prefix length
const NONCE_LEN: usize = 24;

/// Encrypted u32 plus Poly1305 tag
const SEALED_VALUE_LEN: usize = 4 + 16;

/// Total handle length in bytes.
pub const HANDLE_LEN: usize = NONCE_LEN + SEALED_VALUE_LEN;

/// Label for input proofs
const PROOF_LABEL: &[u8] = b"ghostnet/input-proof/v1";

/// HKDF info for the handle encryption key
const ENCRYPTION_KEY_INFO: &[u8] = b"ghostnet/coprocessor/encryption";

/// HKDF info for the proof MAC key
const MAC_KEY_INFO: &[u8] = b"ghostnet/coprocessor/mac";

/// Coprocessor holding the secret behind every handle.
///
/// Cloning is cheap and clones share the same keys. Randomness for handle
/// nonces comes from the environment.
#[derive(Clone)]
pub struct Coprocessor<E> {
    env: E,
    encryption_key: Zeroizing<[u8; 32]>,
    mac_key: Zeroizing<[u8; 32]>,
}

impl<E: Environment> Coprocessor<E> {
    /// Create a coprocessor from its 32-byte secret.
    pub fn new(env: E, secret: &[u8; 32]) -> Self {
        Self {
            env,
            encryption_key: derive_key(secret, ENCRYPTION_KEY_INFO),
            mac_key: derive_key(secret, MAC_KEY_INFO),
        }
    }

    /// Encrypt `value` into a handle for `context` using the given nonce.
    pub fn encrypt_value(
        &self,
        context: ContractAddress,
        value: u32,
        nonce: [u8; NONCE_LEN],
    ) -> KeyHandle {
        let cipher = XChaCha20Poly1305::new((&*self.encryption_key).into());
        let plaintext = value.to_le_bytes();
        let payload = Payload { msg: &plaintext, aad: context.as_bytes() };

        let Ok(sealed) = cipher.encrypt(XNonce::from_slice(&nonce), payload) else {
            unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
        };
        debug_assert_eq!(sealed.len(), SEALED_VALUE_LEN);

        let mut bytes = Vec::with_capacity(HANDLE_LEN);
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&sealed);
        KeyHandle::new(bytes)
    }

    /// Recover the plaintext behind a handle issued for `context`.
    ///
    /// Only the decryption oracle should call this.
    ///
    /// # Errors
    ///
    /// - `MalformedHandle` if the handle has the wrong length
    /// - `DecryptionFailed` if the handle was not issued by this coprocessor
    ///   for `context`
    pub fn decrypt_handle(
        &self,
        context: ContractAddress,
        handle: &KeyHandle,
    ) -> Result<u32, CryptoError> {
        let bytes = handle.as_bytes();
        if bytes.len() != HANDLE_LEN {
            return Err(CryptoError::MalformedHandle { expected: HANDLE_LEN, actual: bytes.len() });
        }

        let (nonce, sealed) = bytes.split_at(NONCE_LEN);
        let cipher = XChaCha20Poly1305::new((&*self.encryption_key).into());
        let payload = Payload { msg: sealed, aad: context.as_bytes() };

        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed { reason: "key handle".to_string() })?;

        let value: [u8; 4] = plaintext.as_slice().try_into().map_err(|_| {
            CryptoError::DecryptionFailed { reason: "key handle length".to_string() }
        })?;

        Ok(u32::from_le_bytes(value))
    }

    /// Proof binding `handle` to `caller` and `context`.
    pub fn prove(
        &self,
        context: ContractAddress,
        caller: Identity,
        handle: &KeyHandle,
    ) -> InputProof {
        InputProof::new(self.proof_mac(context, caller, handle).finalize().into_bytes().to_vec())
    }

    fn proof_mac(
        &self,
        context: ContractAddress,
        caller: Identity,
        handle: &KeyHandle,
    ) -> HmacSha256 {
        let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(&*self.mac_key) else {
            unreachable!("HMAC-SHA256 accepts keys of any length");
        };
        mac.update(PROOF_LABEL);
        mac.update(context.as_bytes());
        mac.update(caller.as_bytes());
        mac.update(handle.as_bytes());
        mac
    }
}

impl<E: Environment> EncryptionCapability for Coprocessor<E> {
    fn encrypt_input(
        &self,
        context: ContractAddress,
        caller: Identity,
        value: u32,
    ) -> EncryptedInput {
        let mut nonce = [0u8; NONCE_LEN];
        self.env.random_bytes(&mut nonce);

        let handle = self.encrypt_value(context, value, nonce);
        let proof = self.prove(context, caller, &handle);
        EncryptedInput { handle, proof }
    }
}

impl<E: Environment> InputVerifier for Coprocessor<E> {
    fn verify_input(
        &self,
        context: ContractAddress,
        caller: Identity,
        handle: &KeyHandle,
        proof: &InputProof,
    ) -> Result<(), GhostError> {
        if handle.as_bytes().len() != HANDLE_LEN {
            return Err(GhostError::InvalidProof(format!(
                "malformed handle: expected {HANDLE_LEN} bytes, got {}",
                handle.as_bytes().len()
            )));
        }

        self.proof_mac(context, caller, handle)
            .verify_slice(proof.as_bytes())
            .map_err(|_| {
                GhostError::InvalidProof("proof does not match caller and contract".to_string())
            })
    }
}

impl<E> std::fmt::Debug for Coprocessor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coprocessor").finish_non_exhaustive()
    }
}

fn derive_key(secret: &[u8; 32], info: &[u8]) -> Zeroizing<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(None, secret);

    let mut key = Zeroizing::new([0u8; 32]);
    let Ok(()) = hkdf.expand(info, &mut key[..]) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    key
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    };

    use super::*;

    /// Counter-based environment; enough for nonce generation.
    #[derive(Clone, Default)]
    struct CountingEnv(Arc<AtomicU8>);

    impl Environment for CountingEnv {
        fn wall_clock_secs(&self) -> u64 {
            0
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let next = self.0.fetch_add(1, Ordering::Relaxed);
            buffer.fill(next);
        }
    }

    const CONTRACT: ContractAddress = ContractAddress::from_bytes([0xc0; 20]);
    const ALICE: Identity = Identity::from_bytes([0xa1; 20]);
    const BOB: Identity = Identity::from_bytes([0xb0; 20]);

    fn coprocessor() -> Coprocessor<CountingEnv> {
        Coprocessor::new(CountingEnv::default(), &[42u8; 32])
    }

    #[test]
    fn handle_decrypts_to_original_value() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 6_543_210);

        assert_eq!(input.handle.as_bytes().len(), HANDLE_LEN);
        assert_eq!(copro.decrypt_handle(CONTRACT, &input.handle).unwrap(), 6_543_210);
    }

    #[test]
    fn same_value_gives_distinct_handles() {
        let copro = coprocessor();
        let first = copro.encrypt_input(CONTRACT, ALICE, 7);
        let second = copro.encrypt_input(CONTRACT, ALICE, 7);

        assert_ne!(first.handle, second.handle);
    }

    #[test]
    fn proof_verifies_for_bound_caller_and_contract() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 1_357_924);

        assert!(copro.verify_input(CONTRACT, ALICE, &input.handle, &input.proof).is_ok());
    }

    #[test]
    fn proof_rejects_other_caller() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 1_357_924);

        let result = copro.verify_input(CONTRACT, BOB, &input.handle, &input.proof);
        assert!(matches!(result, Err(GhostError::InvalidProof(_))));
    }

    #[test]
    fn proof_rejects_other_contract() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 1_357_924);
        let other = ContractAddress::from_bytes([0xc1; 20]);

        let result = copro.verify_input(other, ALICE, &input.handle, &input.proof);
        assert!(matches!(result, Err(GhostError::InvalidProof(_))));
    }

    #[test]
    fn malformed_handle_is_invalid_proof() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 1);
        let truncated = KeyHandle::new(input.handle.as_bytes()[..10].to_vec());

        let result = copro.verify_input(CONTRACT, ALICE, &truncated, &input.proof);
        assert!(matches!(result, Err(GhostError::InvalidProof(_))));
    }

    #[test]
    fn handle_is_bound_to_contract() {
        let copro = coprocessor();
        let input = copro.encrypt_input(CONTRACT, ALICE, 99);
        let other = ContractAddress::from_bytes([0xc1; 20]);

        assert!(copro.decrypt_handle(other, &input.handle).is_err());
    }

    #[test]
    fn other_secret_cannot_decrypt() {
        let copro = coprocessor();
        let stranger = Coprocessor::new(CountingEnv::default(), &[43u8; 32]);
        let input = copro.encrypt_input(CONTRACT, ALICE, 99);

        assert!(stranger.decrypt_handle(CONTRACT, &input.handle).is_err());
        assert!(stranger.verify_input(CONTRACT, ALICE, &input.handle, &input.proof).is_err());
    }
}
