//! The GhostNet ledger.
//!
//! [`GhostNet`] composes the four components behind the [`GhostLedger`]
//! entry points. Writes take `&mut self`, so the ledger applies them one at
//! a time; each write reaches storage as a single atomic mutation.
//!
//! ```text
//! create_room ──verify proof──► RoomRegistry ──► Storage
//! join ─────────────────────► MembershipGate ──► KeyStore ──► Storage
//! send ─────────────────────► MessageLedger ───────────────► Storage
//! ```

use ghostnet_core::{
    ContractAddress, Environment, GhostError, GhostLedger, Identity, InputProof, InputVerifier,
    KeyHandle, LedgerEvent, Message, Receipt, Room, RoomId,
};
use ghostnet_crypto::Coprocessor;

use crate::{
    config::{GatewayConfig, LedgerConfig},
    key_store::KeyStore,
    membership::MembershipGate,
    messages::MessageLedger,
    oracle::Gateway,
    registry::RoomRegistry,
    storage::Storage,
};

/// Encrypted-room ledger.
///
/// Generic over the environment (time), the storage backend and the input
/// verifier, so the same logic runs against `MemoryStorage` under simulation
/// and `RedbStorage` in the node.
pub struct GhostNet<E, S, V> {
    env: E,
    config: LedgerConfig,
    verifier: V,
    registry: RoomRegistry<S>,
    keys: KeyStore<S>,
    gate: MembershipGate<S>,
    messages: MessageLedger<S>,
}

impl<E, S, V> GhostNet<E, S, V>
where
    E: Environment,
    S: Storage,
    V: InputVerifier,
{
    /// Ledger over `storage`, verifying inputs with `verifier`.
    ///
    /// Existing state in `storage` is picked up as-is; there is no separate
    /// recovery step.
    pub fn new(env: E, storage: S, verifier: V, config: LedgerConfig) -> Self {
        let keys = KeyStore::new(storage.clone());

        Self {
            env,
            config,
            verifier,
            registry: RoomRegistry::new(storage.clone()),
            gate: MembershipGate::new(keys.clone()),
            keys,
            messages: MessageLedger::new(storage),
        }
    }

    /// Ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Read access to keys and access lists.
    pub fn key_store(&self) -> &KeyStore<S> {
        &self.keys
    }

    /// Decryption gateway bound to this ledger's key store and contract.
    pub fn gateway(&self, coprocessor: Coprocessor<E>) -> Gateway<E, S> {
        Gateway::new(
            self.env.clone(),
            coprocessor,
            self.keys.clone(),
            GatewayConfig { contract_address: self.config.contract_address, ..Default::default() },
        )
    }
}

impl<E, S, V> GhostLedger for GhostNet<E, S, V>
where
    E: Environment,
    S: Storage,
    V: InputVerifier,
{
    fn contract_address(&self) -> ContractAddress {
        self.config.contract_address
    }

    fn create_room(
        &mut self,
        caller: Identity,
        name: &str,
        handle: KeyHandle,
        proof: InputProof,
    ) -> Result<Receipt<RoomId>, GhostError> {
        self.verifier
            .verify_input(self.config.contract_address, caller, &handle, &proof)
            .inspect_err(|e| tracing::warn!(creator = %caller, error = %e, "Rejected room key"))?;

        let room = self.registry.register(caller, name, handle, self.env.wall_clock_secs())?;

        tracing::info!(room_id = %room.id, creator = %caller, name, "Room created");

        Ok(Receipt::new(room.id, LedgerEvent::RoomCreated { room_id: room.id, creator: caller }))
    }

    fn get_room(&self, room_id: RoomId) -> Result<Room, GhostError> {
        self.registry.get(room_id)
    }

    fn get_all_rooms(&self) -> Result<Vec<Room>, GhostError> {
        self.registry.all()
    }

    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, GhostError> {
        self.gate.is_member(room_id, identity)
    }

    fn join(&mut self, caller: Identity, room_id: RoomId) -> Result<Receipt<()>, GhostError> {
        self.gate.join(room_id, caller, self.env.wall_clock_secs()).inspect_err(|e| {
            tracing::debug!(room_id = %room_id, identity = %caller, error = %e, "Join rejected");
        })?;

        tracing::info!(room_id = %room_id, identity = %caller, "Member joined");

        Ok(Receipt::new((), LedgerEvent::MemberJoined { room_id, identity: caller }))
    }

    fn send(
        &mut self,
        caller: Identity,
        room_id: RoomId,
        ciphertext: String,
    ) -> Result<Receipt<u64>, GhostError> {
        let index = self
            .messages
            .append(room_id, caller, ciphertext, self.env.wall_clock_secs())
            .inspect_err(|e| {
                tracing::debug!(room_id = %room_id, sender = %caller, error = %e, "Send rejected");
            })?;

        tracing::debug!(room_id = %room_id, sender = %caller, index, "Message appended");

        Ok(Receipt::new(index, LedgerEvent::MessageSent { room_id, sender: caller, index }))
    }

    fn count(&self, room_id: RoomId) -> Result<u64, GhostError> {
        self.messages.count(room_id)
    }

    fn list(&self, room_id: RoomId, offset: u64, limit: u64) -> Result<Vec<Message>, GhostError> {
        self.messages.list(room_id, offset, limit)
    }
}

impl<E, S, V> std::fmt::Debug for GhostNet<E, S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostNet").field("config", &self.config).finish_non_exhaustive()
    }
}
