//! XOR stream cipher for room messages.
//!
//! `encrypt(key, m) = base64(utf8(m) XOR cycle(utf8(key)))` and `decrypt` is
//! its inverse. The output is bit-compatible with existing ledger content, so
//! the construction must not change.
//!
//! Decoding is best-effort: a ciphertext that is not valid base64, or was
//! produced under a different key, decrypts to garbage text rather than an
//! error. Invalid UTF-8 is replaced with U+FFFD.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::CipherError;

/// Encrypt `plaintext` under `key`.
///
/// # Errors
///
/// - `CipherError::MissingKey` if `key` is empty
pub fn encrypt(key: &str, plaintext: &str) -> Result<String, CipherError> {
    if key.is_empty() {
        return Err(CipherError::MissingKey);
    }

    Ok(STANDARD.encode(xor_with_key(plaintext.as_bytes(), key.as_bytes())))
}

/// Decrypt `ciphertext` under `key`.
///
/// # Errors
///
/// - `CipherError::MissingKey` if `key` is empty
pub fn decrypt(key: &str, ciphertext: &str) -> Result<String, CipherError> {
    if key.is_empty() {
        return Err(CipherError::MissingKey);
    }

    // Not base64: XOR the raw text so the caller still gets something to show
    let bytes = STANDARD.decode(ciphertext).unwrap_or_else(|_| ciphertext.as_bytes().to_vec());

    Ok(String::from_utf8_lossy(&xor_with_key(&bytes, key.as_bytes())).into_owned())
}

fn xor_with_key(data: &[u8], key: &[u8]) -> Vec<u8> {
    debug_assert!(!key.is_empty());
    data.iter().zip(key.iter().cycle()).map(|(byte, k)| byte ^ k).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn matches_known_ciphertext() {
        insta::assert_snapshot!(encrypt("6543210", "hello").unwrap(), @"XlBYX10=");
        insta::assert_snapshot!(
            encrypt("7777777", "ciphertext-hello").unwrap(),
            @"VF5HX1JFQ1JPQxpfUltbWA=="
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(encrypt("", "hello"), Err(CipherError::MissingKey));
        assert_eq!(decrypt("", "XlBYX10="), Err(CipherError::MissingKey));
    }

    #[test]
    fn empty_message_encrypts_to_empty() {
        assert_eq!(encrypt("123456", "").unwrap(), "");
        assert_eq!(decrypt("123456", "").unwrap(), "");
    }

    #[test]
    fn wrong_key_yields_garbage_not_error() {
        let ciphertext = encrypt("12345678", "Meet at midnight").unwrap();
        let garbage = decrypt("87654321", &ciphertext).unwrap();
        assert_ne!(garbage, "Meet at midnight");
    }

    #[test]
    fn non_base64_input_is_best_effort() {
        let result = decrypt("123456", "not base64 at all!");
        assert!(result.is_ok());
    }

    #[test]
    fn multibyte_text_round_trips() {
        let message = "ghosts 👻 réunion";
        let ciphertext = encrypt("99999999", message).unwrap();
        assert_eq!(decrypt("99999999", &ciphertext).unwrap(), message);
    }

    proptest! {
        #[test]
        fn prop_decrypt_inverts_encrypt(key in ".{1,16}", message in ".{0,256}") {
            let ciphertext = encrypt(&key, &message).unwrap();
            prop_assert_eq!(decrypt(&key, &ciphertext).unwrap(), message);
        }

        #[test]
        fn prop_ciphertext_length_tracks_plaintext(key in "[0-9]{6,8}", message in ".{0,128}") {
            let ciphertext = encrypt(&key, &message).unwrap();
            let decoded = STANDARD.decode(&ciphertext).unwrap();
            prop_assert_eq!(decoded.len(), message.len());
        }
    }
}
