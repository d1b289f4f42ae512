//! Reference ledger.
//!
//! Straight-line implementation of the room, membership and message rules
//! with no storage, no cryptography and no indirection. It is the oracle the
//! real ledger is checked against.

use std::collections::BTreeSet;

use super::operation::{
    ActorId, ModelMessage, ModelRoomId, Operation, OperationError, OperationResult, room_name,
};
use crate::sim_env::SIM_EPOCH_SECS;

/// One room in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoom {
    /// Room name.
    pub name: String,
    /// Creator.
    pub creator: ActorId,
    /// Creation time.
    pub created_at: u64,
    /// Access list.
    pub members: BTreeSet<ActorId>,
    /// Message log.
    pub messages: Vec<ModelMessage>,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Rooms in id order.
    pub rooms: Vec<ObservedRoom>,
}

/// One room as seen through the ledger's read entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRoom {
    /// Room id.
    pub id: u64,
    /// Room name.
    pub name: String,
    /// Creator.
    pub creator: ActorId,
    /// Creation time.
    pub created_at: u64,
    /// Reported member count.
    pub member_count: u64,
    /// Access list, ascending.
    pub members: Vec<ActorId>,
    /// Full message log.
    pub messages: Vec<ModelMessage>,
}

/// Model ledger - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelLedger {
    num_actors: usize,
    now: u64,
    rooms: Vec<ModelRoom>,
}

impl ModelLedger {
    /// Empty ledger with `num_actors` valid actors.
    pub fn new(num_actors: usize) -> Self {
        Self { num_actors, now: SIM_EPOCH_SECS, rooms: Vec::new() }
    }

    /// Rooms in id order.
    pub fn rooms(&self) -> &[ModelRoom] {
        &self.rooms
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::CreateRoom { actor, name } => {
                if !self.valid_actor(*actor) {
                    return OperationResult::Skipped;
                }
                self.create(*actor, room_name(*name))
            },
            Operation::ForgedCreate { actor, victim } => {
                if !self.valid_actor(*actor) || !self.valid_actor(*victim) {
                    return OperationResult::Skipped;
                }
                if actor == victim {
                    self.create(*actor, String::new())
                } else {
                    OperationResult::Error(OperationError::InvalidProof)
                }
            },
            Operation::ReplayKey { actor, room_id } => {
                if !self.valid_actor(*actor) || self.room(*room_id).is_none() {
                    return OperationResult::Skipped;
                }
                OperationResult::Error(OperationError::InvalidProof)
            },
            Operation::Join { actor, room_id } => {
                if !self.valid_actor(*actor) {
                    return OperationResult::Skipped;
                }
                let Some(room) = self.room_mut(*room_id) else {
                    return OperationResult::Error(OperationError::NotFound);
                };
                if room.members.insert(*actor) {
                    OperationResult::Joined
                } else {
                    OperationResult::Error(OperationError::AlreadyMember)
                }
            },
            Operation::Send { actor, room_id, content } => {
                if !self.valid_actor(*actor) {
                    return OperationResult::Skipped;
                }
                let now = self.now;
                let Some(room) = self.room_mut(*room_id) else {
                    return OperationResult::Error(OperationError::NotFound);
                };
                if !room.members.contains(actor) {
                    return OperationResult::Error(OperationError::NotMember);
                }
                room.messages.push(ModelMessage {
                    sender: *actor,
                    ciphertext: content.to_text(),
                    timestamp: now,
                });
                OperationResult::Sent(room.messages.len() as u64 - 1)
            },
            Operation::List { room_id, offset, limit } => {
                let Some(room) = self.room(*room_id) else {
                    return OperationResult::Error(OperationError::NotFound);
                };
                let window = room
                    .messages
                    .iter()
                    .skip(usize::from(*offset))
                    .take(usize::from(*limit))
                    .cloned()
                    .collect();
                OperationResult::Listed(window)
            },
            Operation::AdvanceTime { secs } => {
                self.now += u64::from(*secs);
                OperationResult::Advanced
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let rooms = self
            .rooms
            .iter()
            .enumerate()
            .map(|(index, room)| ObservedRoom {
                id: index as u64 + 1,
                name: room.name.clone(),
                creator: room.creator,
                created_at: room.created_at,
                member_count: room.members.len() as u64,
                members: room.members.iter().copied().collect(),
                messages: room.messages.clone(),
            })
            .collect();

        ObservableState { rooms }
    }

    fn create(&mut self, creator: ActorId, name: String) -> OperationResult {
        self.rooms.push(ModelRoom {
            name,
            creator,
            created_at: self.now,
            members: BTreeSet::from([creator]),
            messages: Vec::new(),
        });
        OperationResult::Created(self.rooms.len() as u64)
    }

    fn valid_actor(&self, actor: ActorId) -> bool {
        usize::from(actor) < self.num_actors
    }

    fn room(&self, room_id: ModelRoomId) -> Option<&ModelRoom> {
        self.rooms.get(usize::from(room_id).checked_sub(1)?)
    }

    fn room_mut(&mut self, room_id: ModelRoomId) -> Option<&mut ModelRoom> {
        self.rooms.get_mut(usize::from(room_id).checked_sub(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SmallMessage;

    #[test]
    fn double_join_rejected() {
        let mut model = ModelLedger::new(2);

        assert_eq!(
            model.apply(&Operation::CreateRoom { actor: 0, name: 1 }),
            OperationResult::Created(1)
        );
        assert_eq!(model.apply(&Operation::Join { actor: 1, room_id: 1 }), OperationResult::Joined);
        assert_eq!(
            model.apply(&Operation::Join { actor: 1, room_id: 1 }),
            OperationResult::Error(OperationError::AlreadyMember)
        );
        assert_eq!(model.observable_state().rooms[0].member_count, 2);
    }

    #[test]
    fn send_requires_membership() {
        let mut model = ModelLedger::new(2);
        model.apply(&Operation::CreateRoom { actor: 0, name: 1 });
        let content = SmallMessage { seed: 1, size_class: 1 };

        assert_eq!(
            model.apply(&Operation::Send { actor: 1, room_id: 1, content: content.clone() }),
            OperationResult::Error(OperationError::NotMember)
        );
        assert_eq!(
            model.apply(&Operation::Send { actor: 0, room_id: 1, content }),
            OperationResult::Sent(0)
        );
    }

    #[test]
    fn room_zero_does_not_exist() {
        let mut model = ModelLedger::new(1);
        model.apply(&Operation::CreateRoom { actor: 0, name: 1 });

        assert_eq!(
            model.apply(&Operation::List { room_id: 0, offset: 0, limit: 1 }),
            OperationResult::Error(OperationError::NotFound)
        );
    }
}
