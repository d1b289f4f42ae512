//! GhostNet client.
//!
//! Explicit request/response calls against a [`GhostLedger`], an
//! [`EncryptionCapability`] and a [`DecryptionOracle`]. The client holds the
//! identity key and a cache of decrypted room keys; everything else is read
//! back from the ledger on demand.

use std::collections::HashMap;

use ed25519_dalek::SigningKey;
use ghostnet_core::{
    DecryptAuthorization, DecryptionOracle, EncryptionCapability, Environment, GhostLedger,
    Identity, RoomId, UserDecryptRequest,
};
use ghostnet_crypto::{EphemeralKeypair, decrypt, encrypt, open_sealed, sign_authorization};

use crate::error::ClientError;

/// Smallest valid room key (6 digits).
pub const ROOM_KEY_MIN: u32 = 100_000;

/// Largest valid room key (8 digits).
pub const ROOM_KEY_MAX: u32 = 99_999_999;

/// Validity window requested for decryption authorizations.
pub const AUTHORIZATION_DAYS: u64 = 10;

/// A message read back from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMessage {
    /// Position in the room's log
    pub index: u64,
    /// Sender identity
    pub sender: Identity,
    /// Ciphertext as stored on the ledger
    pub ciphertext: String,
    /// Ledger time of the append
    pub timestamp: u64,
    /// Decrypted text, when the room key is cached
    pub plaintext: Option<String>,
}

/// Client for one identity.
pub struct GhostClient<E: Environment> {
    env: E,
    signing_key: SigningKey,
    identity: Identity,
    /// Decimal room keys, by room
    keys: HashMap<RoomId, String>,
}

impl<E: Environment> GhostClient<E> {
    /// Client acting as the identity behind `signing_key`.
    pub fn new(env: E, signing_key: SigningKey) -> Self {
        let identity = Identity::from_verifying_key(&signing_key.verifying_key());
        Self { env, signing_key, identity, keys: HashMap::new() }
    }

    /// Ledger identity of this client.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Random room key in `ROOM_KEY_MIN..=ROOM_KEY_MAX`.
    pub fn generate_room_key(&self) -> u32 {
        let span = u64::from(ROOM_KEY_MAX - ROOM_KEY_MIN) + 1;
        ROOM_KEY_MIN + (self.env.random_u64() % span) as u32
    }

    /// Decrypted key for a room, if known.
    pub fn cached_key(&self, room_id: RoomId) -> Option<&str> {
        self.keys.get(&room_id).map(String::as_str)
    }

    /// Encrypt `key` and create a room named `name` with it.
    ///
    /// The name is trimmed before it is sent. On success the key is cached
    /// for the new room, so the creator can send right away.
    ///
    /// # Errors
    ///
    /// - `ClientError::BlankName` if the trimmed name is empty
    /// - `ClientError::InvalidRoomKey` if `key` is not 6-8 digits
    /// - `ClientError::Ledger` if the ledger rejects the call
    pub fn create_room<L, C>(
        &mut self,
        ledger: &mut L,
        capability: &C,
        name: &str,
        key: u32,
    ) -> Result<RoomId, ClientError>
    where
        L: GhostLedger,
        C: EncryptionCapability,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::BlankName);
        }
        if !(ROOM_KEY_MIN..=ROOM_KEY_MAX).contains(&key) {
            return Err(ClientError::InvalidRoomKey(key));
        }

        let input = capability.encrypt_input(ledger.contract_address(), self.identity, key);
        let receipt = ledger.create_room(self.identity, name, input.handle, input.proof)?;
        let room_id = receipt.output;

        self.keys.insert(room_id, key.to_string());
        tracing::info!(room_id = %room_id, identity = %self.identity, name, "Created room");

        Ok(room_id)
    }

    /// Join a room.
    ///
    /// # Errors
    ///
    /// - `ClientError::Ledger` with `NotFound` or `AlreadyMember`
    pub fn join<L: GhostLedger>(&self, ledger: &mut L, room_id: RoomId) -> Result<(), ClientError> {
        ledger.join(self.identity, room_id)?;
        tracing::info!(room_id = %room_id, identity = %self.identity, "Joined room");
        Ok(())
    }

    /// Fetch a room's key through the reencryption handshake and cache it.
    ///
    /// Signs a fresh ephemeral key into a [`AUTHORIZATION_DAYS`]-day
    /// authorization starting now, and opens the oracle's sealed reply.
    ///
    /// # Errors
    ///
    /// - `ClientError::Ledger` if the room does not exist or the oracle denies
    ///   the request
    /// - `ClientError::Crypto` if the reply does not open
    pub fn decrypt_room_key<L, O>(
        &mut self,
        ledger: &L,
        oracle: &O,
        room_id: RoomId,
    ) -> Result<String, ClientError>
    where
        L: GhostLedger,
        O: DecryptionOracle,
    {
        let room = ledger.get_room(room_id)?;
        let keypair = EphemeralKeypair::from_bytes(self.env.random_array32());

        let statement = DecryptAuthorization {
            ephemeral_public_key: keypair.public_key(),
            contract_addresses: vec![ledger.contract_address()],
            start_timestamp: self.env.wall_clock_secs(),
            duration_days: AUTHORIZATION_DAYS,
        };
        let request = UserDecryptRequest {
            handle: room.encrypted_key,
            authorization: sign_authorization(&self.signing_key, statement),
            requester: self.identity,
        };

        let sealed = oracle.user_decrypt(&request).inspect_err(|e| {
            tracing::warn!(
                room_id = %room_id,
                identity = %self.identity,
                error = %e,
                "Key request denied"
            );
        })?;
        let key = open_sealed(&sealed, &keypair)?.to_string();

        self.keys.insert(room_id, key.clone());
        tracing::info!(room_id = %room_id, identity = %self.identity, "Decrypted room key");

        Ok(key)
    }

    /// Encrypt `text` with the cached room key and post it.
    ///
    /// Surrounding whitespace is trimmed before encryption.
    ///
    /// # Errors
    ///
    /// - `ClientError::MissingKey` if the room key is not cached
    /// - `ClientError::BlankMessage` if the trimmed text is empty
    /// - `ClientError::Ledger` with `NotFound` or `NotMember`
    pub fn send_message<L: GhostLedger>(
        &self,
        ledger: &mut L,
        room_id: RoomId,
        text: &str,
    ) -> Result<u64, ClientError> {
        let key = self.cached_key(room_id).ok_or(ClientError::MissingKey(room_id))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::BlankMessage);
        }

        let ciphertext = encrypt(key, text)?;
        let index = ledger.send(self.identity, room_id, ciphertext)?.output;

        tracing::debug!(room_id = %room_id, index, "Sent message");
        Ok(index)
    }

    /// Read a window of a room's log, decrypting with the cached key when
    /// there is one.
    ///
    /// # Errors
    ///
    /// - `ClientError::Ledger` if the room does not exist
    pub fn read_messages<L: GhostLedger>(
        &self,
        ledger: &L,
        room_id: RoomId,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ReadMessage>, ClientError> {
        let key = self.cached_key(room_id);

        ledger
            .list(room_id, offset, limit)?
            .into_iter()
            .zip(offset..)
            .map(|(message, index)| -> Result<ReadMessage, ClientError> {
                let plaintext = key.map(|key| decrypt(key, &message.ciphertext)).transpose()?;
                Ok(ReadMessage {
                    index,
                    sender: message.sender,
                    ciphertext: message.ciphertext,
                    timestamp: message.timestamp,
                    plaintext,
                })
            })
            .collect()
    }
}

impl<E: Environment> std::fmt::Debug for GhostClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostClient")
            .field("identity", &self.identity)
            .field("cached_keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ghostnet_harness::SimEnv;

    use super::*;

    fn client(seed: u64) -> GhostClient<SimEnv> {
        GhostClient::new(SimEnv::with_seed(seed), SigningKey::from_bytes(&[seed as u8; 32]))
    }

    #[test]
    fn generated_keys_are_six_to_eight_digits() {
        let client = client(1);

        for _ in 0..1000 {
            let key = client.generate_room_key();
            assert!((ROOM_KEY_MIN..=ROOM_KEY_MAX).contains(&key), "{key}");
            assert!((6..=8).contains(&key.to_string().len()));
        }
    }

    #[test]
    fn identity_derives_from_signing_key() {
        let key = SigningKey::from_bytes(&[4; 32]);
        let expected = Identity::from_verifying_key(&key.verifying_key());

        assert_eq!(GhostClient::new(SimEnv::default(), key).identity(), expected);
    }

    #[test]
    fn no_keys_cached_initially() {
        assert!(client(2).cached_key(RoomId::new(1)).is_none());
    }
}
