//! Storage snapshots for invariant checking.
//!
//! Captured straight from a [`Storage`] backend, below the ledger, so the
//! checks see what is actually persisted rather than what the ledger reports.

use ghostnet_core::{Identity, Message, Room, RoomId};
use ghostnet_ledger::{Storage, StorageError};

/// Everything persisted for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Stored room record
    pub room: Room,
    /// Stored access list, as returned by storage
    pub members: Vec<Identity>,
    /// Full message log
    pub messages: Vec<Message>,
    /// Room the handle index resolves this room's key to
    pub handle_owner: Option<RoomId>,
}

/// Persisted state of a whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Value of `Storage::room_count`
    pub room_count: u64,
    /// Rooms in the order storage lists them
    pub rooms: Vec<RoomSnapshot>,
}

impl LedgerSnapshot {
    /// Snapshot with no rooms.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the full state of `storage`.
    pub fn capture<S: Storage>(storage: &S) -> Result<Self, StorageError> {
        let rooms = storage
            .list_rooms()?
            .into_iter()
            .map(|room| {
                Ok(RoomSnapshot {
                    members: storage.members(room.id)?,
                    messages: storage.load_messages(room.id, 0, u64::MAX)?,
                    handle_owner: storage.room_for_handle(&room.encrypted_key)?,
                    room,
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Self { room_count: storage.room_count()?, rooms })
    }
}
