//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Every
//! mutation is one write transaction, so a room, its handle index and its
//! first member are either all on disk or none are. All state survives
//! restarts.

use std::{fmt::Display, path::Path, sync::Arc};

use ghostnet_core::{Identity, KeyHandle, Message, Room, RoomId};
use redb::{Database, ReadableTable, TableDefinition};

use super::{Storage, StorageError};

/// Table: rooms
/// Key: room id
/// Value: CBOR-encoded Room
const ROOMS: TableDefinition<u64, &[u8]> = TableDefinition::new("rooms");

/// Table: handles
/// Key: raw key handle bytes
/// Value: owning room id
const HANDLES: TableDefinition<&[u8], u64> = TableDefinition::new("handles");

/// Table: members
/// Key: (room_id: u64 BE, identity: 20 bytes) [28 bytes]
/// Value: ledger time of the join
const MEMBERS: TableDefinition<&[u8], u64> = TableDefinition::new("members");

/// Table: messages
/// Key: (room_id: u64 BE, index: u64 BE) [16 bytes]
/// Value: CBOR-encoded Message
const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (ROOMS, HANDLES, MEMBERS,
    /// MESSAGES).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(ROOMS).map_err(io)?;
            let _ = txn.open_table(HANDLES).map_err(io)?;
            let _ = txn.open_table(MEMBERS).map_err(io)?;
            let _ = txn.open_table(MESSAGES).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn room_count(&self) -> Result<u64, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(ROOMS).map_err(io)?;

        last_room_id(&table)
    }

    fn create_room(&self, room: &Room) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;

        {
            let mut rooms = txn.open_table(ROOMS).map_err(io)?;
            let mut handles = txn.open_table(HANDLES).map_err(io)?;
            let mut members = txn.open_table(MEMBERS).map_err(io)?;

            let expected = last_room_id(&rooms)? + 1;
            if room.id.get() != expected {
                return Err(StorageError::Conflict { expected, got: room.id.get() });
            }

            if let Some(owner) = handles.get(room.encrypted_key.as_bytes()).map_err(io)? {
                return Err(StorageError::DuplicateHandle(RoomId::new(owner.value())));
            }

            let bytes = encode(room)?;
            rooms.insert(room.id.get(), bytes.as_slice()).map_err(io)?;
            handles.insert(room.encrypted_key.as_bytes(), room.id.get()).map_err(io)?;

            let key = encode_member_key(room.id, room.creator);
            members.insert(key.as_slice(), room.created_at).map_err(io)?;
        }

        txn.commit().map_err(io)?;

        Ok(())
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(ROOMS).map_err(io)?;

        match table.get(room_id.get()).map_err(io)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(ROOMS).map_err(io)?;

        let mut rooms = Vec::new();
        for result in table.iter().map_err(io)? {
            let (_, value) = result.map_err(io)?;
            rooms.push(decode(value.value())?);
        }

        Ok(rooms)
    }

    fn room_for_handle(&self, handle: &KeyHandle) -> Result<Option<RoomId>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(HANDLES).map_err(io)?;

        Ok(table.get(handle.as_bytes()).map_err(io)?.map(|owner| RoomId::new(owner.value())))
    }

    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(MEMBERS).map_err(io)?;

        let key = encode_member_key(room_id, identity);
        Ok(table.get(key.as_slice()).map_err(io)?.is_some())
    }

    fn add_member(
        &self,
        room_id: RoomId,
        identity: Identity,
        joined_at: u64,
    ) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;

        {
            let mut rooms = txn.open_table(ROOMS).map_err(io)?;
            let mut members = txn.open_table(MEMBERS).map_err(io)?;

            let mut room: Room = match rooms.get(room_id.get()).map_err(io)? {
                Some(value) => decode(value.value())?,
                None => return Err(StorageError::RoomNotFound(room_id)),
            };

            let key = encode_member_key(room_id, identity);
            if members.get(key.as_slice()).map_err(io)?.is_some() {
                return Err(StorageError::DuplicateMember { room_id, identity });
            }

            room.member_count += 1;
            let bytes = encode(&room)?;

            members.insert(key.as_slice(), joined_at).map_err(io)?;
            rooms.insert(room_id.get(), bytes.as_slice()).map_err(io)?;
        }

        txn.commit().map_err(io)?;

        Ok(())
    }

    fn members(&self, room_id: RoomId) -> Result<Vec<Identity>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(MEMBERS).map_err(io)?;

        let start = encode_member_key(room_id, Identity::from_bytes([0x00; 20]));
        let end = encode_member_key(room_id, Identity::from_bytes([0xff; 20]));

        let mut identities = Vec::new();
        for result in table.range(start.as_slice()..=end.as_slice()).map_err(io)? {
            let (key, _) = result.map_err(io)?;
            identities.push(decode_member_identity(key.value())?);
        }

        Ok(identities)
    }

    fn append_message(
        &self,
        room_id: RoomId,
        index: u64,
        message: &Message,
    ) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;

        {
            let rooms = txn.open_table(ROOMS).map_err(io)?;
            if rooms.get(room_id.get()).map_err(io)?.is_none() {
                return Err(StorageError::RoomNotFound(room_id));
            }

            let mut table = txn.open_table(MESSAGES).map_err(io)?;

            let expected = message_len(&table, room_id)?;
            if index != expected {
                return Err(StorageError::Conflict { expected, got: index });
            }

            let bytes = encode(message)?;
            let key = encode_message_key(room_id, index);
            table.insert(key.as_slice(), bytes.as_slice()).map_err(io)?;
        }

        txn.commit().map_err(io)?;

        Ok(())
    }

    fn message_count(&self, room_id: RoomId) -> Result<u64, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(MESSAGES).map_err(io)?;

        message_len(&table, room_id)
    }

    fn load_messages(
        &self,
        room_id: RoomId,
        from: u64,
        limit: u64,
    ) -> Result<Vec<Message>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(MESSAGES).map_err(io)?;

        let start = encode_message_key(room_id, from);
        let end = encode_message_key(room_id, u64::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let mut messages = Vec::new();
        for result in table.range(start.as_slice()..=end.as_slice()).map_err(io)? {
            if messages.len() >= limit {
                break;
            }

            let (_, value) = result.map_err(io)?;
            messages.push(decode(value.value())?);
        }

        Ok(messages)
    }
}

fn io(err: impl Display) -> StorageError {
    StorageError::Io(err.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Highest room id in the table, 0 if empty.
fn last_room_id<T: ReadableTable<u64, &'static [u8]>>(table: &T) -> Result<u64, StorageError> {
    Ok(table.last().map_err(io)?.map_or(0, |(key, _)| key.value()))
}

/// Length of a room's log: one past the highest stored index.
fn message_len<T: ReadableTable<&'static [u8], &'static [u8]>>(
    table: &T,
    room_id: RoomId,
) -> Result<u64, StorageError> {
    let start = encode_message_key(room_id, 0);
    let end = encode_message_key(room_id, u64::MAX);

    let mut range = table.range(start.as_slice()..=end.as_slice()).map_err(io)?;
    match range.next_back() {
        Some(result) => {
            let (key, _) = result.map_err(io)?;
            Ok(decode_message_index(key.value())? + 1)
        },
        None => Ok(0),
    }
}

/// Encode (room_id, identity) as a 28-byte key.
///
/// Layout: [room_id: 8 bytes BE][identity: 20 bytes]
/// All members of a room are contiguous and ordered by identity.
fn encode_member_key(room_id: RoomId, identity: Identity) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&room_id.get().to_be_bytes());
    key[8..].copy_from_slice(identity.as_bytes());
    key
}

fn decode_member_identity(key: &[u8]) -> Result<Identity, StorageError> {
    let bytes: [u8; 20] = key.get(8..).unwrap_or_default().try_into().map_err(|_| {
        StorageError::Serialization(format!("member key has {} bytes", key.len()))
    })?;
    Ok(Identity::from_bytes(bytes))
}

/// Encode (room_id, index) as a 16-byte big-endian key.
///
/// Layout: [room_id: 8 bytes BE][index: 8 bytes BE]
/// This ensures lexicographic ordering matches numeric ordering.
fn encode_message_key(room_id: RoomId, index: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&room_id.get().to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

fn decode_message_index(key: &[u8]) -> Result<u64, StorageError> {
    let bytes: [u8; 8] = key.get(8..).unwrap_or_default().try_into().map_err(|_| {
        StorageError::Serialization(format!("message key has {} bytes", key.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}
