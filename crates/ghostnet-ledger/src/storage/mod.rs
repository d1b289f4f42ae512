//! Storage abstraction for the GhostNet ledger
//!
//! Trait-based abstraction for persisting rooms, access lists and message
//! logs. The trait is synchronous (no async): every mutation is a single
//! atomic step, so a ledger call that fails leaves no partial state behind.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
use ghostnet_core::{Identity, KeyHandle, Message, Room, RoomId};
pub use memory::MemoryStorage;

pub use self::redb::RedbStorage;

/// Storage abstraction for ledger state
///
/// Must be Clone (the ledger and the decryption gateway share one backend),
/// Send + Sync (thread-safe), and synchronous (no async methods).
/// Implementations share internal state via Arc, so clones access the same
/// underlying storage.
///
/// Implementations enforce the structural invariants on their own so that a
/// buggy caller cannot corrupt state: room ids are dense, handles are unique,
/// access lists have no duplicates and message logs have no gaps.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned (a thread panicked while holding a lock). Acceptable for
/// test/simulation code, but production implementations should handle poisoned
/// mutexes gracefully.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Number of rooms created so far.
    ///
    /// Room ids are dense, so this is also the highest id in use.
    fn room_count(&self) -> Result<u64, StorageError>;

    /// Persist a new room together with its key handle and first member.
    ///
    /// # Invariants
    ///
    /// - Pre: `room.id` must be `room_count() + 1`
    /// - Pre: `room.encrypted_key` must not back another room
    /// - Post: room, handle index and `{room.creator}` access list are
    ///   committed together, or nothing is
    fn create_room(&self, room: &Room) -> Result<(), StorageError>;

    /// Load a room. `None` if it was never created.
    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError>;

    /// All rooms in id order.
    fn list_rooms(&self) -> Result<Vec<Room>, StorageError>;

    /// Room a handle is registered to. `None` if unregistered.
    fn room_for_handle(&self, handle: &KeyHandle) -> Result<Option<RoomId>, StorageError>;

    /// Whether `identity` is in the room's access list.
    ///
    /// Returns `false` for unknown rooms.
    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, StorageError>;

    /// Add `identity` to the room's access list and bump its member count.
    ///
    /// # Invariants
    ///
    /// - Pre: the room exists and `identity` is not yet a member
    /// - Post: access list and `member_count` change together, or neither does
    fn add_member(
        &self,
        room_id: RoomId,
        identity: Identity,
        joined_at: u64,
    ) -> Result<(), StorageError>;

    /// The room's access list, sorted ascending.
    fn members(&self, room_id: RoomId) -> Result<Vec<Identity>, StorageError>;

    /// Append a message to the room's log at the given index
    ///
    /// # Invariants
    ///
    /// - Pre: the room exists
    /// - Pre: `index` must equal the current length of the room's log
    /// - Post: Message is persisted at `index`
    fn append_message(
        &self,
        room_id: RoomId,
        index: u64,
        message: &Message,
    ) -> Result<(), StorageError>;

    /// Length of the room's log. Zero for unknown rooms.
    fn message_count(&self, room_id: RoomId) -> Result<u64, StorageError>;

    /// Load messages from a room's log
    ///
    /// Returns messages in range `[from, from+limit)`.
    /// If fewer than `limit` messages exist, returns all available messages.
    fn load_messages(
        &self,
        room_id: RoomId,
        from: u64,
        limit: u64,
    ) -> Result<Vec<Message>, StorageError>;
}
