//! Standard invariant checks.
//!
//! These hold after every operation regardless of which operations ran or
//! which of them failed.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, LedgerSnapshot, Violation};

/// Room ids are `1..=room_count` with no gaps.
pub struct DenseRoomIds;

impl Invariant for DenseRoomIds {
    fn name(&self) -> &'static str {
        "dense_room_ids"
    }

    fn check(&self, state: &LedgerSnapshot) -> InvariantResult {
        if state.rooms.len() as u64 != state.room_count {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "room_count {} but {} rooms listed",
                    state.room_count,
                    state.rooms.len()
                ),
            });
        }

        for (index, snapshot) in state.rooms.iter().enumerate() {
            if snapshot.room.id.get() != index as u64 + 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room at position {index} has id {}", snapshot.room.id),
                });
            }
        }
        Ok(())
    }
}

/// `member_count` equals the size of the access list, and the list holds no
/// duplicates.
pub struct MemberCountMatchesAcl;

impl Invariant for MemberCountMatchesAcl {
    fn name(&self) -> &'static str {
        "member_count_matches_acl"
    }

    fn check(&self, state: &LedgerSnapshot) -> InvariantResult {
        for snapshot in &state.rooms {
            let distinct: HashSet<_> = snapshot.members.iter().collect();
            if distinct.len() != snapshot.members.len() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {}: duplicate access list entries", snapshot.room.id),
                });
            }

            if snapshot.room.member_count != snapshot.members.len() as u64 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {}: member_count {} but {} authorized",
                        snapshot.room.id,
                        snapshot.room.member_count,
                        snapshot.members.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The creator is always on the access list.
pub struct CreatorIsMember;

impl Invariant for CreatorIsMember {
    fn name(&self) -> &'static str {
        "creator_is_member"
    }

    fn check(&self, state: &LedgerSnapshot) -> InvariantResult {
        for snapshot in &state.rooms {
            if !snapshot.members.contains(&snapshot.room.creator) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {}: creator {} not authorized",
                        snapshot.room.id, snapshot.room.creator
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Each key handle backs exactly one room and resolves back to it.
pub struct UniqueHandles;

impl Invariant for UniqueHandles {
    fn name(&self) -> &'static str {
        "unique_handles"
    }

    fn check(&self, state: &LedgerSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();

        for snapshot in &state.rooms {
            if !seen.insert(snapshot.room.encrypted_key.as_bytes()) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {}: key handle reused", snapshot.room.id),
                });
            }

            if snapshot.handle_owner != Some(snapshot.room.id) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {}: handle index points at {:?}",
                        snapshot.room.id, snapshot.handle_owner
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Every message was sent by a member, never before the room existed, and
/// timestamps never go backwards.
///
/// Membership is never revoked, so a sender that was a member at send time
/// is still one now.
pub struct SendersAreMembers;

impl Invariant for SendersAreMembers {
    fn name(&self) -> &'static str {
        "senders_are_members"
    }

    fn check(&self, state: &LedgerSnapshot) -> InvariantResult {
        for snapshot in &state.rooms {
            let mut last = snapshot.room.created_at;

            for (index, message) in snapshot.messages.iter().enumerate() {
                if !snapshot.members.contains(&message.sender) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "room {} message {index}: sender {} not a member",
                            snapshot.room.id, message.sender
                        ),
                    });
                }

                if message.timestamp < last {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "room {} message {index}: timestamp {} before {last}",
                            snapshot.room.id, message.timestamp
                        ),
                    });
                }
                last = message.timestamp;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ghostnet_core::{Identity, KeyHandle, Message, Room, RoomId};

    use super::*;
    use crate::invariants::RoomSnapshot;

    const ALICE: Identity = Identity::from_bytes([0xa1; 20]);
    const BOB: Identity = Identity::from_bytes([0xb0; 20]);

    fn room_snapshot(id: u64) -> RoomSnapshot {
        RoomSnapshot {
            room: Room {
                id: RoomId::new(id),
                name: format!("room-{id}"),
                creator: ALICE,
                encrypted_key: KeyHandle::new(vec![id as u8; 44]),
                created_at: 100,
                member_count: 1,
            },
            members: vec![ALICE],
            messages: Vec::new(),
            handle_owner: Some(RoomId::new(id)),
        }
    }

    fn snapshot(rooms: Vec<RoomSnapshot>) -> LedgerSnapshot {
        LedgerSnapshot { room_count: rooms.len() as u64, rooms }
    }

    #[test]
    fn consistent_state_passes() {
        let state = snapshot(vec![room_snapshot(1), room_snapshot(2)]);

        assert!(DenseRoomIds.check(&state).is_ok());
        assert!(MemberCountMatchesAcl.check(&state).is_ok());
        assert!(CreatorIsMember.check(&state).is_ok());
        assert!(UniqueHandles.check(&state).is_ok());
        assert!(SendersAreMembers.check(&state).is_ok());
    }

    #[test]
    fn gap_in_ids_detected() {
        let state = snapshot(vec![room_snapshot(1), room_snapshot(3)]);

        let violation = DenseRoomIds.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "dense_room_ids");
    }

    #[test]
    fn stale_member_count_detected() {
        let mut room = room_snapshot(1);
        room.members.push(BOB);

        let violation = MemberCountMatchesAcl.check(&snapshot(vec![room])).unwrap_err();
        insta::assert_snapshot!(
            violation.to_string(),
            @"member_count_matches_acl: room 1: member_count 1 but 2 authorized"
        );
    }

    #[test]
    fn missing_creator_detected() {
        let mut room = room_snapshot(1);
        room.members = vec![BOB];

        assert!(CreatorIsMember.check(&snapshot(vec![room])).is_err());
    }

    #[test]
    fn shared_handle_detected() {
        let mut second = room_snapshot(2);
        second.room.encrypted_key = KeyHandle::new(vec![1; 44]);

        assert!(UniqueHandles.check(&snapshot(vec![room_snapshot(1), second])).is_err());
    }

    #[test]
    fn outsider_message_detected() {
        let mut room = room_snapshot(1);
        room.messages.push(Message { sender: BOB, ciphertext: "x".to_string(), timestamp: 100 });

        assert!(SendersAreMembers.check(&snapshot(vec![room])).is_err());
    }

    #[test]
    fn backwards_timestamp_detected() {
        let mut room = room_snapshot(1);
        room.messages.push(Message { sender: ALICE, ciphertext: "a".to_string(), timestamp: 200 });
        room.messages.push(Message { sender: ALICE, ciphertext: "b".to_string(), timestamp: 150 });

        assert!(SendersAreMembers.check(&snapshot(vec![room])).is_err());
    }
}
