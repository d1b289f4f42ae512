//! In-memory storage backend.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use ghostnet_core::{Identity, KeyHandle, Message, Room, RoomId};

use super::{Storage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// Rooms live in a Vec indexed by `id - 1` (ids are dense), access lists in
/// ordered sets so `members` comes back sorted. All state is wrapped in
/// Arc<Mutex<>> to allow Clone and concurrent access. Uses `lock().expect()`
/// which will panic if the mutex is poisoned - acceptable for test code.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Default)]
struct MemoryStorageInner {
    /// Rooms in id order
    rooms: Vec<Room>,

    /// Handle bytes -> owning room
    handles: HashMap<Vec<u8>, RoomId>,

    /// Access list per room, identity -> joined at
    members: BTreeMap<RoomId, BTreeMap<Identity, u64>>,

    /// Message log per room, in append order
    messages: BTreeMap<RoomId, Vec<Message>>,
}

impl MemoryStorageInner {
    fn room_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        let index = usize::try_from(room_id.get().checked_sub(1)?).ok()?;
        self.rooms.get_mut(index)
    }

    fn room(&self, room_id: RoomId) -> Option<&Room> {
        let index = usize::try_from(room_id.get().checked_sub(1)?).ok()?;
        self.rooms.get(index)
    }
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryStorageInner::default())) }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn room_count(&self) -> Result<u64, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").rooms.len() as u64)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn create_room(&self, room: &Room) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let expected = inner.rooms.len() as u64 + 1;
        if room.id.get() != expected {
            return Err(StorageError::Conflict { expected, got: room.id.get() });
        }

        if let Some(owner) = inner.handles.get(room.encrypted_key.as_bytes()) {
            return Err(StorageError::DuplicateHandle(*owner));
        }

        inner.handles.insert(room.encrypted_key.as_bytes().to_vec(), room.id);
        inner.members.insert(room.id, BTreeMap::from([(room.creator, room.created_at)]));
        inner.messages.insert(room.id, Vec::new());
        inner.rooms.push(room.clone());

        debug_assert_eq!(inner.rooms.len() as u64, room.id.get());

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.room(room_id).cloned())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn list_rooms(&self) -> Result<Vec<Room>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").rooms.clone())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn room_for_handle(&self, handle: &KeyHandle) -> Result<Option<RoomId>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.handles.get(handle.as_bytes()).copied())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.members.get(&room_id).is_some_and(|acl| acl.contains_key(&identity)))
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn add_member(
        &self,
        room_id: RoomId,
        identity: Identity,
        joined_at: u64,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        if inner.room(room_id).is_none() {
            return Err(StorageError::RoomNotFound(room_id));
        }

        let acl = inner.members.entry(room_id).or_default();
        if acl.contains_key(&identity) {
            return Err(StorageError::DuplicateMember { room_id, identity });
        }
        acl.insert(identity, joined_at);
        let acl_len = acl.len() as u64;

        let room = inner.room_mut(room_id).ok_or(StorageError::RoomNotFound(room_id))?;
        room.member_count += 1;

        debug_assert_eq!(room.member_count, acl_len);

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn members(&self, room_id: RoomId) -> Result<Vec<Identity>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.members.get(&room_id).map(|acl| acl.keys().copied().collect()).unwrap_or_default())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn append_message(
        &self,
        room_id: RoomId,
        index: u64,
        message: &Message,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let log = inner.messages.get_mut(&room_id).ok_or(StorageError::RoomNotFound(room_id))?;

        let expected = log.len() as u64;
        if index != expected {
            return Err(StorageError::Conflict { expected, got: index });
        }

        log.push(message.clone());

        debug_assert_eq!(log.len() as u64 - 1, index);

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn message_count(&self, room_id: RoomId) -> Result<u64, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.messages.get(&room_id).map_or(0, |log| log.len() as u64))
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn load_messages(
        &self,
        room_id: RoomId,
        from: u64,
        limit: u64,
    ) -> Result<Vec<Message>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        let Some(log) = inner.messages.get(&room_id) else {
            return Ok(Vec::new());
        };

        let len = log.len() as u64;
        if from >= len {
            return Ok(Vec::new());
        }

        let end = from.saturating_add(limit).min(len);
        Ok(log[from as usize..end as usize].to_vec())
    }
}
