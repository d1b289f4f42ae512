//! Operations for model-based testing.
//!
//! Operations represent every call a client can make against the ledger,
//! plus a few hostile variants. They are generated randomly by proptest (or
//! decoded from fuzzer bytes) and applied to both the model and the real
//! ledger.

use arbitrary::Arbitrary;

/// Actor identifier (0-indexed into the world's identities).
pub type ActorId = u8;

/// Room identifier as seen by the model. 0 and ids past the last room are
/// deliberately reachable so `NotFound` paths get exercised.
pub type ModelRoomId = u8;

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Actor encrypts a fresh key and creates a room with it.
    CreateRoom {
        /// Creator.
        actor: ActorId,
        /// Room name seed (0 means an empty name).
        name: u8,
    },

    /// Actor submits a key encrypted and proven for someone else.
    ///
    /// Succeeds only when `actor == victim`.
    ForgedCreate {
        /// Submitting actor.
        actor: ActorId,
        /// Actor the proof was issued to.
        victim: ActorId,
    },

    /// Actor resubmits the handle and proof of an existing room.
    ReplayKey {
        /// Submitting actor.
        actor: ActorId,
        /// Room whose key is replayed.
        room_id: ModelRoomId,
    },

    /// Actor joins a room.
    Join {
        /// Joining actor.
        actor: ActorId,
        /// Target room.
        room_id: ModelRoomId,
    },

    /// Actor posts a ciphertext to a room.
    Send {
        /// Sender.
        actor: ActorId,
        /// Target room.
        room_id: ModelRoomId,
        /// Ciphertext content.
        content: SmallMessage,
    },

    /// Read a window of a room's log.
    List {
        /// Room to read.
        room_id: ModelRoomId,
        /// First index.
        offset: u8,
        /// Window size.
        limit: u8,
    },

    /// Advance ledger time.
    AdvanceTime {
        /// Seconds to advance.
        secs: u16,
    },
}

/// Small ciphertext content for testing.
///
/// Compact representation that keeps cases small while still covering empty
/// and longer payloads.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallMessage {
    /// Content seed.
    pub seed: u8,
    /// Length hint (0-3 maps to empty/small/medium/large).
    pub size_class: u8,
}

impl SmallMessage {
    /// Expand to the ciphertext string.
    pub fn to_text(&self) -> String {
        let len: u8 = match self.size_class % 4 {
            0 => 0,
            1 => 8,
            2 => 64,
            _ => 200,
        };

        (0..len).map(|i| char::from(b'A' + self.seed.wrapping_add(i) % 26)).collect()
    }
}

/// Room name for a name seed.
pub fn room_name(seed: u8) -> String {
    if seed == 0 { String::new() } else { format!("ghost-{seed}") }
}

/// Message as observed through `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMessage {
    /// Sender.
    pub sender: ActorId,
    /// Ciphertext exactly as sent.
    pub ciphertext: String,
    /// Ledger time of the append.
    pub timestamp: u64,
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Room created with this id.
    Created(u64),
    /// Join succeeded.
    Joined,
    /// Message appended at this index.
    Sent(u64),
    /// Window returned by `list`.
    Listed(Vec<ModelMessage>),
    /// Time advanced.
    Advanced,
    /// Operation not applicable (unknown actor, nothing to replay).
    Skipped,
    /// Operation failed.
    Error(OperationError),
}

/// Errors the ledger can report to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Room does not exist.
    NotFound,
    /// Caller already a member.
    AlreadyMember,
    /// Caller not a member.
    NotMember,
    /// Input proof rejected or handle reused.
    InvalidProof,
    /// Anything the model never produces.
    Unexpected(String),
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(_))
    }
}
