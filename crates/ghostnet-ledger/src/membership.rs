//! Membership Gate
//!
//! Answers "is this identity a member" and admits new members. Membership is
//! the key store's access list; the gate owns no state of its own.
//!
//! Per (room, identity) the only transition is `Unknown -> Member`, through
//! room creation or a successful join. There is no leave or revoke.

use ghostnet_core::{GhostError, Identity, RoomId};

use crate::{key_store::KeyStore, storage::Storage};

/// Admission control for rooms.
#[derive(Clone)]
pub struct MembershipGate<S> {
    keys: KeyStore<S>,
}

impl<S: Storage> MembershipGate<S> {
    /// Gate reading and writing `keys`' access lists.
    pub fn new(keys: KeyStore<S>) -> Self {
        Self { keys }
    }

    /// Whether `identity` is in the room's access list.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    pub fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, GhostError> {
        self.keys.is_authorized(room_id, identity)
    }

    /// Add `caller` to the room.
    ///
    /// Grants decryption rights for the room key and permission to send.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    /// - `GhostError::AlreadyMember` if the caller is already a member; the
    ///   member count is unchanged
    pub fn join(&self, room_id: RoomId, caller: Identity, now: u64) -> Result<(), GhostError> {
        if self.keys.is_authorized(room_id, caller)? {
            return Err(GhostError::AlreadyMember { room_id, identity: caller });
        }

        self.keys.authorize(room_id, caller, now)
    }
}

#[cfg(test)]
mod tests {
    use ghostnet_core::{KeyHandle, Room};

    use super::*;
    use crate::storage::MemoryStorage;

    const ALICE: Identity = Identity::from_bytes([0xa1; 20]);
    const BOB: Identity = Identity::from_bytes([0xb0; 20]);

    fn gate() -> (MembershipGate<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        storage
            .create_room(&Room {
                id: RoomId::new(1),
                name: "gate".to_string(),
                creator: ALICE,
                encrypted_key: KeyHandle::new(vec![3; 44]),
                created_at: 0,
                member_count: 1,
            })
            .unwrap();
        (MembershipGate::new(KeyStore::new(storage.clone())), storage)
    }

    #[test]
    fn join_admits_new_member() {
        let (gate, storage) = gate();

        gate.join(RoomId::new(1), BOB, 5).unwrap();

        assert!(gate.is_member(RoomId::new(1), BOB).unwrap());
        assert_eq!(storage.load_room(RoomId::new(1)).unwrap().unwrap().member_count, 2);
    }

    #[test]
    fn creator_cannot_join_again() {
        let (gate, storage) = gate();

        assert_eq!(
            gate.join(RoomId::new(1), ALICE, 5),
            Err(GhostError::AlreadyMember { room_id: RoomId::new(1), identity: ALICE })
        );
        assert_eq!(storage.load_room(RoomId::new(1)).unwrap().unwrap().member_count, 1);
    }

    #[test]
    fn join_unknown_room() {
        let (gate, _) = gate();

        assert_eq!(gate.join(RoomId::new(7), BOB, 5), Err(GhostError::NotFound(RoomId::new(7))));
        assert_eq!(gate.is_member(RoomId::new(7), BOB), Err(GhostError::NotFound(RoomId::new(7))));
    }
}
