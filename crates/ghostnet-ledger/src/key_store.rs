//! Confidential Key Store
//!
//! One encrypted key per room, bound at creation and never reassigned, plus
//! the room's access list. The access list is the single source of truth for
//! membership: the gate reads it to admit senders and the decryption gateway
//! reads it before releasing a key.
//!
//! Nothing here ever sees a plaintext key.

use ghostnet_core::{GhostError, Identity, KeyHandle, RoomId};

use crate::storage::Storage;

/// Read access to room keys and access lists.
///
/// The only way to grow an access list is [`crate::MembershipGate::join`].
#[derive(Clone)]
pub struct KeyStore<S> {
    storage: S,
}

impl<S: Storage> KeyStore<S> {
    /// Key store over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Encrypted key of a room.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn handle(&self, room_id: RoomId) -> Result<KeyHandle, GhostError> {
        self.storage
            .load_room(room_id)?
            .map(|room| room.encrypted_key)
            .ok_or(GhostError::NotFound(room_id))
    }

    /// Room a handle belongs to.
    ///
    /// # Errors
    ///
    /// - `GhostError::UnknownHandle` if no room was created with this handle
    pub fn room_for_handle(&self, handle: &KeyHandle) -> Result<RoomId, GhostError> {
        self.storage.room_for_handle(handle)?.ok_or(GhostError::UnknownHandle)
    }

    /// Whether `identity` may decrypt the room's key.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn is_authorized(&self, room_id: RoomId, identity: Identity) -> Result<bool, GhostError> {
        self.ensure_room(room_id)?;
        Ok(self.storage.is_member(room_id, identity)?)
    }

    /// The room's access list, sorted ascending.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn authorized_identities(&self, room_id: RoomId) -> Result<Vec<Identity>, GhostError> {
        self.ensure_room(room_id)?;
        Ok(self.storage.members(room_id)?)
    }

    /// Add `identity` to the access list.
    pub(crate) fn authorize(
        &self,
        room_id: RoomId,
        identity: Identity,
        at: u64,
    ) -> Result<(), GhostError> {
        Ok(self.storage.add_member(room_id, identity, at)?)
    }

    fn ensure_room(&self, room_id: RoomId) -> Result<(), GhostError> {
        if self.storage.room_count()? < room_id.get() || room_id < RoomId::FIRST {
            return Err(GhostError::NotFound(room_id));
        }
        Ok(())
    }
}
