//! Chaos property tests for the ledger.
//!
//! The ledger runs over `ChaoticStorage`, which fails a random fraction of
//! storage calls. Whatever fails, the state underneath must stay consistent
//! and a failed call must leave it untouched.

use ghostnet_core::{GhostError, Identity, KeyHandle, Message, Room, RoomId};
use ghostnet_harness::{
    InvariantRegistry, LedgerSnapshot, Operation, OperationError, OperationResult, SimLedger,
    SmallMessage,
};
use ghostnet_ledger::{ChaoticStorage, MemoryStorage, Storage, StorageError};
use proptest::prelude::*;

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let actor = 0..3u8;
    let room_id = 0..4u8;

    prop_oneof![
        3 => (actor.clone(), any::<u8>())
            .prop_map(|(actor, name)| Operation::CreateRoom { actor, name }),
        3 => (actor.clone(), room_id.clone())
            .prop_map(|(actor, room_id)| Operation::Join { actor, room_id }),
        4 => (actor, room_id, any::<u8>()).prop_map(|(actor, room_id, seed)| Operation::Send {
            actor,
            room_id,
            content: SmallMessage { seed, size_class: 1 },
        }),
    ]
}

#[test]
fn prop_ledger_chaos_atomic_operations() {
    proptest!(|(
        failure_rate in 0.0..0.6,
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 1..60),
    )| {
        let storage = ChaoticStorage::with_seed(MemoryStorage::new(), failure_rate, seed);
        let mut real = SimLedger::new(seed, 3, storage);
        let invariants = InvariantRegistry::standard();

        for op in &ops {
            let before = LedgerSnapshot::capture(real.storage().inner()).unwrap();
            let result = real.apply(op);
            let after = LedgerSnapshot::capture(real.storage().inner()).unwrap();

            if let Err(violations) = invariants.check_all(&after) {
                return Err(TestCaseError::fail(format!("{op:?}: {violations:?}")));
            }

            match result {
                OperationResult::Error(OperationError::Unexpected(reason)) => {
                    prop_assert!(reason.starts_with("storage error"), "{}", reason);
                    prop_assert_eq!(&before, &after, "failed {:?} changed state", op);
                },
                OperationResult::Error(_) => {
                    prop_assert_eq!(&before, &after);
                },
                _ => {},
            }
        }
    });
}

#[test]
fn prop_failed_create_consumes_no_id() {
    proptest!(|(seed in any::<u64>(), attempts in 1usize..30)| {
        let storage = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, seed);
        let mut real = SimLedger::new(seed, 1, storage);

        let mut created = 0u64;
        for _ in 0..attempts {
            let result = real.apply(&Operation::CreateRoom { actor: 0, name: 1 });
            if let OperationResult::Created(id) = result {
                created += 1;
                prop_assert_eq!(id, created);
            }
        }

        prop_assert_eq!(real.storage().inner().room_count().unwrap(), created);
    });
}

#[test]
fn storage_failures_surface_as_storage_errors() {
    let storage = ChaoticStorage::with_seed(MemoryStorage::new(), 1.0, 0);
    let mut real = SimLedger::new(0, 1, storage.clone());

    let result = real.apply(&Operation::CreateRoom { actor: 0, name: 1 });
    let OperationResult::Error(OperationError::Unexpected(reason)) = result else {
        panic!("expected storage failure, got {result:?}");
    };
    insta::assert_snapshot!(reason, @"storage error: I/O error: chaotic failure injection");
    assert!(storage.operation_count() > 0);
    assert_eq!(storage.inner().room_count().unwrap(), 0);
}

#[test]
fn failed_append_leaves_log_dense() {
    let inner = MemoryStorage::new();
    inner
        .create_room(&Room {
            id: RoomId::new(1),
            name: "dense".to_string(),
            creator: Identity::from_bytes([1; 20]),
            encrypted_key: KeyHandle::new(vec![1; 44]),
            created_at: 0,
            member_count: 1,
        })
        .unwrap();
    let message = Message {
        sender: Identity::from_bytes([1; 20]),
        ciphertext: "m".to_string(),
        timestamp: 0,
    };

    // Index 1 is not the next index; nothing may be written
    let err = inner.append_message(RoomId::new(1), 1, &message).unwrap_err();
    assert!(matches!(err, StorageError::Conflict { expected: 0, got: 1 }));
    assert_eq!(inner.message_count(RoomId::new(1)).unwrap(), 0);

    let ghost: GhostError = err.into();
    assert!(!ghost.is_caller_error());
}
