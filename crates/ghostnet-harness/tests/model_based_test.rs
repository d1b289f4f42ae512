//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! ledger behaves identically to the reference model, on both storage
//! backends, while every persisted-state invariant keeps holding.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelLedger     SimLedger       Compare
//!      (reference)   (GhostNet+S)     Results
//! ```

use ghostnet_harness::{
    InvariantRegistry, ModelLedger, ModelRoomId, Operation, OperationError, OperationResult,
    SimLedger, SmallMessage,
};
use ghostnet_ledger::{MemoryStorage, RedbStorage, Storage};
use proptest::prelude::*;

fn small_message_strategy() -> impl Strategy<Value = SmallMessage> {
    (any::<u8>(), any::<u8>()).prop_map(|(seed, size_class)| SmallMessage { seed, size_class })
}

/// Strategy for generating operations.
///
/// Actor ids run one past the largest world so unknown actors are covered;
/// room ids include 0 and ids past the last room.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    let actor = 0..5u8;
    let room_id: std::ops::Range<ModelRoomId> = 0..6;

    prop_oneof![
        3 => (actor.clone(), any::<u8>())
            .prop_map(|(actor, name)| Operation::CreateRoom { actor, name }),
        1 => (actor.clone(), actor.clone())
            .prop_map(|(actor, victim)| Operation::ForgedCreate { actor, victim }),
        1 => (actor.clone(), room_id.clone())
            .prop_map(|(actor, room_id)| Operation::ReplayKey { actor, room_id }),
        4 => (actor.clone(), room_id.clone())
            .prop_map(|(actor, room_id)| Operation::Join { actor, room_id }),
        5 => (actor, room_id.clone(), small_message_strategy())
            .prop_map(|(actor, room_id, content)| Operation::Send { actor, room_id, content }),
        2 => (room_id, any::<u8>(), 0..8u8)
            .prop_map(|(room_id, offset, limit)| Operation::List {
                room_id,
                offset: offset % 8,
                limit,
            }),
        1 => any::<u16>().prop_map(|secs| Operation::AdvanceTime { secs }),
    ]
}

/// Run `ops` against both implementations, comparing every result, every
/// invariant and the final observable state.
fn check_against_model<S: Storage>(
    seed: u64,
    num_actors: usize,
    storage: S,
    ops: &[Operation],
) -> Result<(), TestCaseError> {
    let mut model = ModelLedger::new(num_actors);
    let mut real = SimLedger::new(seed, num_actors, storage);
    let invariants = InvariantRegistry::standard();

    for (step, op) in ops.iter().enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);
        prop_assert_eq!(&actual, &expected, "step {}: {:?}", step, op);

        let snapshot = real.snapshot().map_err(|e| TestCaseError::fail(e.to_string()))?;
        if let Err(violations) = invariants.check_all(&snapshot) {
            return Err(TestCaseError::fail(format!("step {step} ({op:?}): {violations:?}")));
        }
    }

    let observed = real.observable_state().map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(observed, model.observable_state());
    Ok(())
}

proptest! {
    /// Core model-based test against the in-memory backend.
    #[test]
    fn prop_model_matches_memory(
        seed in any::<u64>(),
        num_actors in 2..5usize,
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        check_against_model(seed, num_actors, MemoryStorage::new(), &ops)?;
    }

    /// A member can always send; a non-member never can.
    #[test]
    fn prop_send_requires_membership(
        creator in 0..4u8,
        other in 0..4u8,
        content in small_message_strategy()
    ) {
        prop_assume!(creator != other);
        let mut model = ModelLedger::new(4);
        model.apply(&Operation::CreateRoom { actor: creator, name: 1 });

        let result =
            model.apply(&Operation::Send { actor: other, room_id: 1, content: content.clone() });
        prop_assert_eq!(result, OperationResult::Error(OperationError::NotMember));

        model.apply(&Operation::Join { actor: other, room_id: 1 });
        let result = model.apply(&Operation::Send { actor: other, room_id: 1, content });
        prop_assert_eq!(result, OperationResult::Sent(0));
    }

    /// Failed operations never change observable state.
    #[test]
    fn prop_errors_leave_state_unchanged(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let mut real = SimLedger::new(seed, 4, MemoryStorage::new());

        for op in &ops {
            let before = real.observable_state().map_err(|e| TestCaseError::fail(e.to_string()))?;
            let result = real.apply(op);
            let after = real.observable_state().map_err(|e| TestCaseError::fail(e.to_string()))?;

            if !result.is_ok() {
                prop_assert_eq!(before, after, "{:?} failed but changed state", op);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Same model comparison against the durable backend.
    #[test]
    fn prop_model_matches_redb(
        seed in any::<u64>(),
        num_actors in 2..5usize,
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let dir = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let storage = RedbStorage::open(dir.path().join("ledger.redb"))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        check_against_model(seed, num_actors, storage, &ops)?;
    }
}

#[test]
fn observable_state_matches() {
    let mut model = ModelLedger::new(3);
    let mut real = SimLedger::new(12345, 3, MemoryStorage::new());

    let ops = [
        Operation::CreateRoom { actor: 0, name: 1 },
        Operation::Join { actor: 1, room_id: 1 },
        Operation::AdvanceTime { secs: 30 },
        Operation::Send { actor: 1, room_id: 1, content: SmallMessage { seed: 5, size_class: 2 } },
        Operation::Send { actor: 2, room_id: 1, content: SmallMessage { seed: 6, size_class: 1 } },
        Operation::CreateRoom { actor: 2, name: 0 },
        Operation::Join { actor: 1, room_id: 1 },
    ];

    let invariants = InvariantRegistry::standard();
    for op in &ops {
        assert_eq!(real.apply(op), model.apply(op), "{op:?}");
        invariants.assert_all(&real.snapshot().unwrap(), &format!("after {op:?}"));
    }

    let state = real.observable_state().unwrap();
    assert_eq!(state, model.observable_state());
    assert_eq!(state.rooms.len(), 2);
    assert_eq!(state.rooms[0].member_count, 2);
    assert_eq!(state.rooms[0].messages.len(), 1);
    assert_eq!(state.rooms[1].name, "");
}

#[test]
fn same_seed_same_handles() {
    let mut a = SimLedger::new(77, 2, MemoryStorage::new());
    let mut b = SimLedger::new(77, 2, MemoryStorage::new());

    a.apply(&Operation::CreateRoom { actor: 0, name: 1 });
    b.apply(&Operation::CreateRoom { actor: 0, name: 1 });

    let handle_a = a.snapshot().unwrap().rooms[0].room.encrypted_key.clone();
    let handle_b = b.snapshot().unwrap().rooms[0].room.encrypted_key.clone();
    assert_eq!(handle_a, handle_b);
}
