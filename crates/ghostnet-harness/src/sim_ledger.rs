//! Real ledger under simulation.
//!
//! [`SimLedger`] wires a [`GhostNet`] to a seeded [`SimEnv`], a
//! [`Coprocessor`] and any [`Storage`] backend, and gives every actor a
//! deterministic Ed25519 identity. It applies the same [`Operation`]s as
//! [`crate::model::ModelLedger`] so the two can be compared step by step.

use ed25519_dalek::SigningKey;
use ghostnet_core::{
    EncryptedInput, EncryptionCapability, Environment, GhostError, GhostLedger, Identity, RoomId,
};
use ghostnet_crypto::Coprocessor;
use ghostnet_ledger::{Gateway, GhostNet, LedgerConfig, Storage, StorageError};

use crate::{
    invariants::LedgerSnapshot,
    model::{
        ActorId, ModelMessage, ModelRoomId, ObservableState, ObservedRoom, Operation,
        OperationError, OperationResult, room_name,
    },
    sim_env::SimEnv,
};

/// Range of room key values, matching what clients generate.
const ROOM_KEY_MIN: u32 = 100_000;
const ROOM_KEY_SPAN: u64 = 99_900_000;

/// A simulated participant.
pub struct SimActor {
    signing_key: SigningKey,
    identity: Identity,
}

impl SimActor {
    /// Signing key for authorizations.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Ledger identity derived from the signing key.
    pub fn identity(&self) -> Identity {
        self.identity
    }
}

/// The real ledger stack driven by model operations.
pub struct SimLedger<S: Storage> {
    env: SimEnv,
    storage: S,
    coprocessor: Coprocessor<SimEnv>,
    ledger: GhostNet<SimEnv, S, Coprocessor<SimEnv>>,
    actors: Vec<SimActor>,
    /// Encrypted input each room was created with, by room index
    issued: Vec<EncryptedInput>,
}

impl<S: Storage> SimLedger<S> {
    /// Fresh ledger over `storage` with `num_actors` identities.
    ///
    /// Identities, the coprocessor secret and every handle derive from
    /// `seed`.
    pub fn new(seed: u64, num_actors: usize, storage: S) -> Self {
        let env = SimEnv::with_seed(seed);
        let coprocessor = Coprocessor::new(env.clone(), &env.random_array32());

        let actors = (0..num_actors)
            .map(|_| {
                let signing_key = SigningKey::from_bytes(&env.random_array32());
                let identity = Identity::from_verifying_key(&signing_key.verifying_key());
                SimActor { signing_key, identity }
            })
            .collect();

        let ledger = GhostNet::new(
            env.clone(),
            storage.clone(),
            coprocessor.clone(),
            LedgerConfig::default(),
        );

        Self { env, storage, coprocessor, ledger, actors, issued: Vec::new() }
    }

    /// Simulation environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Ledger under test.
    pub fn ledger(&self) -> &GhostNet<SimEnv, S, Coprocessor<SimEnv>> {
        &self.ledger
    }

    /// Mutable ledger under test.
    pub fn ledger_mut(&mut self) -> &mut GhostNet<SimEnv, S, Coprocessor<SimEnv>> {
        &mut self.ledger
    }

    /// Coprocessor that issued every handle.
    pub fn coprocessor(&self) -> &Coprocessor<SimEnv> {
        &self.coprocessor
    }

    /// Actor by id.
    pub fn actor(&self, actor: ActorId) -> Option<&SimActor> {
        self.actors.get(usize::from(actor))
    }

    /// Decryption gateway over this ledger.
    pub fn gateway(&self) -> Gateway<SimEnv, S> {
        self.ledger.gateway(self.coprocessor.clone())
    }

    /// Apply an operation to the real ledger.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        tracing::trace!(?op, now = self.env.now(), "Applying operation");

        match op {
            Operation::CreateRoom { actor, name } => {
                let Some(caller) = self.identity(*actor) else {
                    return OperationResult::Skipped;
                };
                let input = self.encrypt_room_key(caller);
                self.create(caller, &room_name(*name), input)
            },
            Operation::ForgedCreate { actor, victim } => {
                let (Some(caller), Some(victim)) = (self.identity(*actor), self.identity(*victim))
                else {
                    return OperationResult::Skipped;
                };
                let input = self.encrypt_room_key(victim);
                self.create(caller, "", input)
            },
            Operation::ReplayKey { actor, room_id } => {
                let Some(caller) = self.identity(*actor) else {
                    return OperationResult::Skipped;
                };
                let Some(input) = usize::from(*room_id)
                    .checked_sub(1)
                    .and_then(|index| self.issued.get(index))
                    .cloned()
                else {
                    return OperationResult::Skipped;
                };
                self.create(caller, "replay", input)
            },
            Operation::Join { actor, room_id } => {
                let Some(caller) = self.identity(*actor) else {
                    return OperationResult::Skipped;
                };
                match self.ledger.join(caller, room(*room_id)) {
                    Ok(_) => OperationResult::Joined,
                    Err(e) => OperationResult::Error(convert_error(&e)),
                }
            },
            Operation::Send { actor, room_id, content } => {
                let Some(caller) = self.identity(*actor) else {
                    return OperationResult::Skipped;
                };
                match self.ledger.send(caller, room(*room_id), content.to_text()) {
                    Ok(receipt) => OperationResult::Sent(receipt.output),
                    Err(e) => OperationResult::Error(convert_error(&e)),
                }
            },
            Operation::List { room_id, offset, limit } => {
                match self.ledger.list(room(*room_id), u64::from(*offset), u64::from(*limit)) {
                    Ok(messages) => OperationResult::Listed(
                        messages
                            .into_iter()
                            .map(|message| ModelMessage {
                                sender: self.actor_id(message.sender),
                                ciphertext: message.ciphertext,
                                timestamp: message.timestamp,
                            })
                            .collect(),
                    ),
                    Err(e) => OperationResult::Error(convert_error(&e)),
                }
            },
            Operation::AdvanceTime { secs } => {
                self.env.advance(u64::from(*secs));
                OperationResult::Advanced
            },
        }
    }

    /// Read everything back through the ledger's public entry points.
    pub fn observable_state(&self) -> Result<ObservableState, GhostError> {
        let rooms = self
            .ledger
            .get_all_rooms()?
            .into_iter()
            .map(|room| {
                let mut members: Vec<ActorId> = self
                    .ledger
                    .key_store()
                    .authorized_identities(room.id)?
                    .into_iter()
                    .map(|identity| self.actor_id(identity))
                    .collect();
                members.sort_unstable();
                let messages = self
                    .ledger
                    .list(room.id, 0, u64::MAX)?
                    .into_iter()
                    .map(|message| ModelMessage {
                        sender: self.actor_id(message.sender),
                        ciphertext: message.ciphertext,
                        timestamp: message.timestamp,
                    })
                    .collect();

                Ok(ObservedRoom {
                    id: room.id.get(),
                    name: room.name,
                    creator: self.actor_id(room.creator),
                    created_at: room.created_at,
                    member_count: room.member_count,
                    members,
                    messages,
                })
            })
            .collect::<Result<Vec<_>, GhostError>>()?;

        Ok(ObservableState { rooms })
    }

    /// Raw storage snapshot for invariant checking.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, StorageError> {
        LedgerSnapshot::capture(&self.storage)
    }

    fn create(&mut self, caller: Identity, name: &str, input: EncryptedInput) -> OperationResult {
        match self.ledger.create_room(caller, name, input.handle.clone(), input.proof.clone()) {
            Ok(receipt) => {
                self.issued.push(input);
                OperationResult::Created(receipt.output.get())
            },
            Err(e) => OperationResult::Error(convert_error(&e)),
        }
    }

    fn encrypt_room_key(&self, owner: Identity) -> EncryptedInput {
        let value = ROOM_KEY_MIN + (self.env.random_u64() % ROOM_KEY_SPAN) as u32;
        self.coprocessor.encrypt_input(self.ledger.contract_address(), owner, value)
    }

    fn identity(&self, actor: ActorId) -> Option<Identity> {
        self.actor(actor).map(SimActor::identity)
    }

    /// Actor id for an identity; identities outside the world map to
    /// `ActorId::MAX` so they show up as a mismatch.
    fn actor_id(&self, identity: Identity) -> ActorId {
        self.actors
            .iter()
            .position(|actor| actor.identity == identity)
            .map_or(ActorId::MAX, |index| index as ActorId)
    }
}

impl<S: Storage> std::fmt::Debug for SimLedger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimLedger")
            .field("env", &self.env)
            .field("actors", &self.actors.len())
            .field("rooms", &self.issued.len())
            .finish_non_exhaustive()
    }
}

fn room(room_id: ModelRoomId) -> RoomId {
    RoomId::new(u64::from(room_id))
}

fn convert_error(error: &GhostError) -> OperationError {
    match error {
        GhostError::NotFound(_) => OperationError::NotFound,
        GhostError::AlreadyMember { .. } => OperationError::AlreadyMember,
        GhostError::NotMember { .. } => OperationError::NotMember,
        GhostError::InvalidProof(_) => OperationError::InvalidProof,
        other => OperationError::Unexpected(other.to_string()),
    }
}
