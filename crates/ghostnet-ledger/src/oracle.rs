//! Decryption gateway.
//!
//! Releases a room key to a requester only after checking a signed,
//! time-bounded authorization against the key store's access list. The
//! plaintext never leaves the gateway unsealed: it is encrypted to the
//! ephemeral key named in the authorization.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. signature verifies under the included signer key
//! 2. signer key derives to the requester identity
//! 3. this contract is listed
//! 4. `start <= now < start + days * 86400`
//! 5. `1 <= days <= max_duration_days`
//! 6. handle belongs to a room (`UnknownHandle` otherwise)
//! 7. requester is in that room's access list

use ghostnet_core::{
    DecryptionOracle, DenialReason, Environment, GhostError, RoomId, SealedPlaintext,
    UserDecryptRequest,
};
use ghostnet_crypto::{Coprocessor, CryptoError, seal_plaintext, verify_authorization};

use crate::{config::GatewayConfig, key_store::KeyStore, storage::Storage};

/// Decryption oracle backed by the ledger's key store.
pub struct Gateway<E, S> {
    env: E,
    coprocessor: Coprocessor<E>,
    keys: KeyStore<S>,
    config: GatewayConfig,
}

impl<E: Environment, S: Storage> Gateway<E, S> {
    /// Gateway answering for `keys`, decrypting with `coprocessor`.
    pub fn new(
        env: E,
        coprocessor: Coprocessor<E>,
        keys: KeyStore<S>,
        config: GatewayConfig,
    ) -> Self {
        Self { env, coprocessor, keys, config }
    }

    /// Gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run every check and return the room the handle belongs to.
    fn authorize(&self, request: &UserDecryptRequest) -> Result<RoomId, GhostError> {
        let signed = &request.authorization;
        let statement = &signed.statement;

        let signer = verify_authorization(signed).map_err(|_| deny(DenialReason::BadSignature))?;
        if signer != request.requester {
            return Err(deny(DenialReason::SignerMismatch { signer, requester: request.requester }));
        }

        if !statement.covers(self.config.contract_address) {
            return Err(deny(DenialReason::ContractNotAuthorized));
        }

        let now = self.env.wall_clock_secs();
        if now < statement.start_timestamp {
            return Err(deny(DenialReason::NotYetValid { start: statement.start_timestamp }));
        }
        if now >= statement.expires_at() {
            return Err(deny(DenialReason::Expired { expired_at: statement.expires_at() }));
        }

        let days = statement.duration_days;
        if days == 0 || days > self.config.max_duration_days {
            return Err(deny(DenialReason::InvalidDuration { days }));
        }

        let room_id = self.keys.room_for_handle(&request.handle)?;
        if !self.keys.is_authorized(room_id, request.requester)? {
            return Err(deny(DenialReason::NotAuthorized {
                room_id,
                identity: request.requester,
            }));
        }

        Ok(room_id)
    }
}

impl<E: Environment, S: Storage> DecryptionOracle for Gateway<E, S> {
    fn user_decrypt(&self, request: &UserDecryptRequest) -> Result<SealedPlaintext, GhostError> {
        let room_id = self.authorize(request).inspect_err(|e| {
            tracing::warn!(requester = %request.requester, error = %e, "Decryption denied");
        })?;

        let value = self
            .coprocessor
            .decrypt_handle(self.config.contract_address, &request.handle)
            .map_err(|e| {
                tracing::error!(
                    room_id = %room_id,
                    error = %e,
                    "Registered handle does not decrypt"
                );
                GhostError::InvalidProof(e.to_string())
            })?;

        let mut nonce = [0u8; 24];
        self.env.random_bytes(&mut nonce);
        let ephemeral_public_key = &request.authorization.statement.ephemeral_public_key;

        let sealed = seal_plaintext(value, ephemeral_public_key, self.env.random_array32(), nonce)
            .map_err(|e| match e {
                CryptoError::DegenerateKey => deny(DenialReason::InvalidEphemeralKey),
                other => GhostError::InvalidProof(other.to_string()),
            })?;

        tracing::info!(room_id = %room_id, requester = %request.requester, "Room key released");

        Ok(sealed)
    }
}

impl<E, S> std::fmt::Debug for Gateway<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("config", &self.config).finish_non_exhaustive()
    }
}

fn deny(reason: DenialReason) -> GhostError {
    GhostError::AuthorizationDenied(reason)
}
