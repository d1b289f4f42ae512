//! Reencryption handshake primitives.
//!
//! All functions are pure - random bytes must be provided by the caller.
//!
//! # Security
//!
//! - The authorization signature covers a domain-separated digest, so it
//!   cannot be replayed as a signature over another message type
//! - The sealed reply uses a fresh oracle keypair per request; the seal key
//!   is bound to both public keys through the HKDF info
//! - Non-contributory X25519 results (low-order points) are rejected

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use ghostnet_core::{DecryptAuthorization, Identity, SealedPlaintext, SignedAuthorization};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// HKDF salt for the sealed reply
const SEAL_SALT: &[u8] = b"ghostnet/seal/v1";

/// One-time X25519 keypair held by a client for a single decryption.
pub struct EphemeralKeypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeypair {
    /// Build a keypair from 32 random bytes.
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public half, to be placed in the authorization statement.
    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Sign an authorization statement with an identity key.
pub fn sign_authorization(
    signing_key: &SigningKey,
    statement: DecryptAuthorization,
) -> SignedAuthorization {
    let signature: Signature = signing_key.sign(&statement.signing_digest());

    SignedAuthorization {
        statement,
        signer_key: signing_key.verifying_key().to_bytes(),
        signature: signature.to_bytes(),
    }
}

/// Verify an authorization and return the signer's identity.
///
/// # Errors
///
/// - `InvalidSignerKey` if the key bytes are not a valid point
/// - `BadSignature` if the signature does not verify
pub fn verify_authorization(authorization: &SignedAuthorization) -> Result<Identity, CryptoError> {
    let key = VerifyingKey::from_bytes(&authorization.signer_key)
        .map_err(|_| CryptoError::InvalidSignerKey)?;
    let signature = Signature::from_bytes(&authorization.signature);

    key.verify_strict(&authorization.statement.signing_digest(), &signature)
        .map_err(|_| CryptoError::BadSignature)?;

    Ok(Identity::from_verifying_key(&key))
}

/// Seal `value` to a recipient's ephemeral public key.
///
/// `oracle_secret` and `nonce` must be fresh random bytes for every call.
///
/// # Errors
///
/// - `DegenerateKey` if the recipient key is a low-order point
pub fn seal_plaintext(
    value: u32,
    recipient_public_key: &[u8; 32],
    oracle_secret: [u8; 32],
    nonce: [u8; 24],
) -> Result<SealedPlaintext, CryptoError> {
    let secret = StaticSecret::from(oracle_secret);
    let oracle_public_key = PublicKey::from(&secret).to_bytes();
    let recipient = PublicKey::from(*recipient_public_key);

    let shared = secret.diffie_hellman(&recipient);
    if !shared.was_contributory() {
        return Err(CryptoError::DegenerateKey);
    }

    let key = derive_seal_key(shared.as_bytes(), &oracle_public_key, recipient_public_key);
    let cipher = XChaCha20Poly1305::new((&*key).into());

    let plaintext = value.to_le_bytes();
    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), &plaintext[..]) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    Ok(SealedPlaintext { oracle_public_key, nonce, ciphertext })
}

/// Open a sealed reply with the ephemeral keypair it was sealed to.
///
/// # Errors
///
/// - `DegenerateKey` if the oracle key is a low-order point
/// - `DecryptionFailed` if the reply was sealed to another key or tampered
pub fn open_sealed(
    sealed: &SealedPlaintext,
    keypair: &EphemeralKeypair,
) -> Result<u32, CryptoError> {
    let oracle = PublicKey::from(sealed.oracle_public_key);
    let shared = keypair.secret.diffie_hellman(&oracle);
    if !shared.was_contributory() {
        return Err(CryptoError::DegenerateKey);
    }

    let key = derive_seal_key(shared.as_bytes(), &sealed.oracle_public_key, &keypair.public_key());
    let cipher = XChaCha20Poly1305::new((&*key).into());

    let plaintext = cipher
        .decrypt(XNonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed { reason: "sealed reply".to_string() })?;

    let bytes: [u8; 4] = plaintext.as_slice().try_into().map_err(|_| CryptoError::DecryptionFailed {
        reason: format!("expected 4 bytes, got {}", plaintext.len()),
    })?;

    Ok(u32::from_le_bytes(bytes))
}

/// Derive the seal key: HKDF-SHA256(salt, shared, info = `oracle_pk` ||
/// `recipient_pk`).
fn derive_seal_key(
    shared: &[u8; 32],
    oracle_public_key: &[u8; 32],
    recipient_public_key: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(Some(SEAL_SALT), shared);

    let mut info = [0u8; 64];
    info[..32].copy_from_slice(oracle_public_key);
    info[32..].copy_from_slice(recipient_public_key);

    let mut key = Zeroizing::new([0u8; 32]);
    let Ok(()) = hkdf.expand(&info, &mut key[..]) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    key
}

#[cfg(test)]
mod tests {
    use ghostnet_core::ContractAddress;

    use super::*;

    fn statement(ephemeral: &EphemeralKeypair) -> DecryptAuthorization {
        DecryptAuthorization {
            ephemeral_public_key: ephemeral.public_key(),
            contract_addresses: vec![ContractAddress::from_bytes([5u8; 20])],
            start_timestamp: 1_700_000_000,
            duration_days: 10,
        }
    }

    #[test]
    fn signed_authorization_verifies_to_signer() {
        let signing_key = SigningKey::from_bytes(&[1u8; 32]);
        let ephemeral = EphemeralKeypair::from_bytes([2u8; 32]);

        let signed = sign_authorization(&signing_key, statement(&ephemeral));
        let identity = verify_authorization(&signed).unwrap();

        assert_eq!(identity, Identity::from_verifying_key(&signing_key.verifying_key()));
    }

    #[test]
    fn tampered_statement_fails_verification() {
        let signing_key = SigningKey::from_bytes(&[1u8; 32]);
        let ephemeral = EphemeralKeypair::from_bytes([2u8; 32]);

        let mut signed = sign_authorization(&signing_key, statement(&ephemeral));
        signed.statement.duration_days = 3650;

        assert_eq!(verify_authorization(&signed), Err(CryptoError::BadSignature));
    }

    #[test]
    fn swapped_signer_key_fails_verification() {
        let signing_key = SigningKey::from_bytes(&[1u8; 32]);
        let other = SigningKey::from_bytes(&[9u8; 32]);
        let ephemeral = EphemeralKeypair::from_bytes([2u8; 32]);

        let mut signed = sign_authorization(&signing_key, statement(&ephemeral));
        signed.signer_key = other.verifying_key().to_bytes();

        assert_eq!(verify_authorization(&signed), Err(CryptoError::BadSignature));
    }

    #[test]
    fn sealed_value_opens_with_matching_keypair() {
        let ephemeral = EphemeralKeypair::from_bytes([7u8; 32]);
        let sealed =
            seal_plaintext(6_543_210, &ephemeral.public_key(), [8u8; 32], [0u8; 24]).unwrap();

        assert_eq!(open_sealed(&sealed, &ephemeral).unwrap(), 6_543_210);
    }

    #[test]
    fn sealed_value_does_not_open_with_other_keypair() {
        let ephemeral = EphemeralKeypair::from_bytes([7u8; 32]);
        let eavesdropper = EphemeralKeypair::from_bytes([6u8; 32]);
        let sealed =
            seal_plaintext(6_543_210, &ephemeral.public_key(), [8u8; 32], [0u8; 24]).unwrap();

        assert!(matches!(
            open_sealed(&sealed, &eavesdropper),
            Err(CryptoError::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let ephemeral = EphemeralKeypair::from_bytes([7u8; 32]);
        let mut sealed =
            seal_plaintext(12_345_678, &ephemeral.public_key(), [8u8; 32], [1u8; 24]).unwrap();
        sealed.ciphertext[0] ^= 0x01;

        assert!(open_sealed(&sealed, &ephemeral).is_err());
    }

    #[test]
    fn low_order_recipient_key_is_rejected() {
        assert_eq!(
            seal_plaintext(1, &[0u8; 32], [8u8; 32], [0u8; 24]),
            Err(CryptoError::DegenerateKey)
        );
    }
}
