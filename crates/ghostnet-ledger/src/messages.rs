//! Message Ledger
//!
//! Per-room append-only log of ciphertexts. Only members may append; anyone
//! may read. Entries are stored exactly as given and never change.

use ghostnet_core::{GhostError, Identity, Message, RoomId};

use crate::storage::Storage;

/// Append-only message logs, one per room.
#[derive(Clone)]
pub struct MessageLedger<S> {
    storage: S,
}

impl<S: Storage> MessageLedger<S> {
    /// Message ledger over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Append a ciphertext from `sender` and return its index.
    ///
    /// No size limit and no deduplication: the same ciphertext sent twice is
    /// two entries.
    ///
    /// # Invariants
    ///
    /// - Post: returned index == `count()` before the call
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    /// - `GhostError::NotMember` if `sender` is not in the room's access list
    pub fn append(
        &self,
        room_id: RoomId,
        sender: Identity,
        ciphertext: String,
        timestamp: u64,
    ) -> Result<u64, GhostError> {
        self.ensure_room(room_id)?;

        if !self.storage.is_member(room_id, sender)? {
            return Err(GhostError::NotMember { room_id, identity: sender });
        }

        let index = self.storage.message_count(room_id)?;
        self.storage.append_message(room_id, index, &Message { sender, ciphertext, timestamp })?;

        Ok(index)
    }

    /// Number of entries in the room's log.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn count(&self, room_id: RoomId) -> Result<u64, GhostError> {
        self.ensure_room(room_id)?;
        Ok(self.storage.message_count(room_id)?)
    }

    /// Entries `[offset, min(offset + limit, count))` in append order.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn list(
        &self,
        room_id: RoomId,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Message>, GhostError> {
        self.ensure_room(room_id)?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        Ok(self.storage.load_messages(room_id, offset, limit)?)
    }

    fn ensure_room(&self, room_id: RoomId) -> Result<(), GhostError> {
        if self.storage.room_count()? < room_id.get() || room_id < RoomId::FIRST {
            return Err(GhostError::NotFound(room_id));
        }
        Ok(())
    }
}
