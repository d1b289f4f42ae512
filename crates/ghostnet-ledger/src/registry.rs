//! Room Registry
//!
//! Allocates dense room ids and records each room together with its
//! encrypted key. Rooms are never destroyed; after creation only their member
//! count changes, and only through the membership gate.

use ghostnet_core::{GhostError, Identity, KeyHandle, Room, RoomId};

use crate::storage::Storage;

/// Creates and looks up rooms.
#[derive(Clone)]
pub struct RoomRegistry<S> {
    storage: S,
}

impl<S: Storage> RoomRegistry<S> {
    /// Registry over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Record a new room owned by `creator`.
    ///
    /// The caller must already have verified the input proof for
    /// `encrypted_key`. Assigns the next sequential id; the creator becomes
    /// the first authorized identity.
    ///
    /// # Errors
    ///
    /// - `GhostError::InvalidProof` if the handle already backs a room
    /// - `GhostError::Storage` if the backend fails; no id is consumed
    pub fn register(
        &self,
        creator: Identity,
        name: &str,
        encrypted_key: KeyHandle,
        created_at: u64,
    ) -> Result<Room, GhostError> {
        if let Some(owner) = self.storage.room_for_handle(&encrypted_key)? {
            return Err(GhostError::InvalidProof(format!("key handle already backs room {owner}")));
        }

        let id = RoomId::new(self.storage.room_count()? + 1);
        let room = Room {
            id,
            name: name.to_string(),
            creator,
            encrypted_key,
            created_at,
            member_count: 1,
        };

        self.storage.create_room(&room)?;

        debug_assert!(id >= RoomId::FIRST);

        Ok(room)
    }

    /// Public view of one room.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the id was never assigned
    pub fn get(&self, room_id: RoomId) -> Result<Room, GhostError> {
        self.storage.load_room(room_id)?.ok_or(GhostError::NotFound(room_id))
    }

    /// All rooms, id ascending.
    pub fn all(&self) -> Result<Vec<Room>, GhostError> {
        Ok(self.storage.list_rooms()?)
    }

    /// Number of rooms created.
    pub fn len(&self) -> Result<u64, GhostError> {
        Ok(self.storage.room_count()?)
    }

    /// Whether no room has been created yet.
    pub fn is_empty(&self) -> Result<bool, GhostError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const ALICE: Identity = Identity::from_bytes([0xa1; 20]);

    fn handle(seed: u8) -> KeyHandle {
        KeyHandle::new(vec![seed; 44])
    }

    #[test]
    fn ids_are_dense_from_one() {
        let registry = RoomRegistry::new(MemoryStorage::new());
        assert!(registry.is_empty().unwrap());

        let first = registry.register(ALICE, "one", handle(1), 10).unwrap();
        let second = registry.register(ALICE, "two", handle(2), 11).unwrap();

        assert_eq!(first.id, RoomId::new(1));
        assert_eq!(second.id, RoomId::new(2));
        assert_eq!(registry.len().unwrap(), 2);
    }

    #[test]
    fn register_sets_creator_and_count() {
        let registry = RoomRegistry::new(MemoryStorage::new());
        let room = registry.register(ALICE, "Cipher Club", handle(1), 1_700_000_000).unwrap();

        assert_eq!(registry.get(room.id).unwrap(), room);
        assert_eq!(room.creator, ALICE);
        assert_eq!(room.member_count, 1);
        assert_eq!(room.created_at, 1_700_000_000);
    }

    #[test]
    fn blank_name_is_accepted() {
        let registry = RoomRegistry::new(MemoryStorage::new());
        assert!(registry.register(ALICE, "", handle(1), 0).is_ok());
    }

    #[test]
    fn reused_handle_allocates_nothing() {
        let registry = RoomRegistry::new(MemoryStorage::new());
        registry.register(ALICE, "one", handle(1), 0).unwrap();

        let result = registry.register(ALICE, "again", handle(1), 0);
        assert!(matches!(result, Err(GhostError::InvalidProof(_))));
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn unknown_room_is_not_found() {
        let registry = RoomRegistry::new(MemoryStorage::new());
        assert_eq!(registry.get(RoomId::new(1)), Err(GhostError::NotFound(RoomId::new(1))));
        assert!(registry.all().unwrap().is_empty());
    }
}
