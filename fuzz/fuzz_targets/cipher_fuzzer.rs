//! Fuzz target for the room message cipher
//!
//! # Strategy
//!
//! - Round trip: arbitrary key and plaintext through encrypt then decrypt
//! - Garbage: arbitrary ciphertext strings, base64 or not
//! - Wrong key: decrypting under a different key
//!
//! # Invariants
//!
//! - `decrypt(k, encrypt(k, m)) == m` for every non-empty key
//! - Ciphertext is always valid base64 of the plaintext's byte length
//! - Empty keys are rejected, never panic
//! - Decrypting garbage or under the wrong key NEVER panics

#![no_main]

use arbitrary::Arbitrary;
use ghostnet_crypto::{CipherError, decrypt, encrypt};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum CipherCase {
    RoundTrip { key: String, plaintext: String },
    Garbage { key: String, ciphertext: String },
    WrongKey { key: String, other: String, plaintext: String },
}

fuzz_target!(|case: CipherCase| {
    match case {
        CipherCase::RoundTrip { key, plaintext } => {
            if key.is_empty() {
                assert_eq!(encrypt(&key, &plaintext), Err(CipherError::MissingKey));
                return;
            }

            let ciphertext = encrypt(&key, &plaintext).expect("non-empty key encrypts");
            assert_eq!(ciphertext.len(), plaintext.len().div_ceil(3) * 4);
            assert_eq!(decrypt(&key, &ciphertext).expect("non-empty key decrypts"), plaintext);
        },
        CipherCase::Garbage { key, ciphertext } => {
            let _ = decrypt(&key, &ciphertext);
        },
        CipherCase::WrongKey { key, other, plaintext } => {
            if let Ok(ciphertext) = encrypt(&key, &plaintext) {
                let _ = decrypt(&other, &ciphertext);
            }
        },
    }
});
