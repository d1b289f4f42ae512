//! Events emitted by ledger writes.
//!
//! Events are an observable side channel: correctness never depends on them,
//! but clients use them to refresh their views after a write.

use serde::{Deserialize, Serialize};

use crate::{identity::Identity, room::RoomId};

/// Something that happened on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A room was registered.
    RoomCreated {
        /// New room id
        room_id: RoomId,
        /// Identity that created the room
        creator: Identity,
    },

    /// An identity joined a room and gained decryption rights.
    MemberJoined {
        /// Room joined
        room_id: RoomId,
        /// Identity that joined
        identity: Identity,
    },

    /// A ciphertext was appended to a room's log.
    MessageSent {
        /// Room the message was sent to
        room_id: RoomId,
        /// Sender identity
        sender: Identity,
        /// Position in the room's log
        index: u64,
    },
}

/// Result of a committed ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
    /// Value returned by the call
    pub output: T,
    /// Events emitted, in emission order
    pub events: Vec<LedgerEvent>,
}

impl<T> Receipt<T> {
    /// Receipt carrying a single event.
    pub fn new(output: T, event: LedgerEvent) -> Self {
        Self { output, events: vec![event] }
    }
}
