//! Chaotic storage wrapper for fault injection testing
//!
//! Storage wrapper that randomly fails operations before they reach the
//! underlying backend. Used to check that a ledger call interrupted by a
//! storage failure leaves no partial state behind.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ghostnet_core::{Identity, KeyHandle, Message, Room, RoomId};

use super::{Storage, StorageError};

/// Chaotic storage wrapper that randomly injects failures
///
/// Delegates to an underlying storage implementation but randomly fails
/// operations based on a configured failure rate. An injected failure never
/// reaches the inner storage, so it models a transaction that aborted before
/// commit.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operations attempted, failed or not
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator; reproducible from its seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Create a new chaotic storage wrapper
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    #[allow(clippy::panic)]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying storage (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Count the operation and decide whether it fails.
    #[allow(clippy::expect_used)]
    fn attempt(&self) -> Result<(), StorageError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        let roll = self.rng.lock().expect("ChaoticRng mutex poisoned").next();
        if roll < self.failure_rate {
            return Err(StorageError::Io("chaotic failure injection".to_string()));
        }

        Ok(())
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn room_count(&self) -> Result<u64, StorageError> {
        self.attempt()?;
        self.inner.room_count()
    }

    fn create_room(&self, room: &Room) -> Result<(), StorageError> {
        self.attempt()?;
        self.inner.create_room(room)
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StorageError> {
        self.attempt()?;
        self.inner.load_room(room_id)
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StorageError> {
        self.attempt()?;
        self.inner.list_rooms()
    }

    fn room_for_handle(&self, handle: &KeyHandle) -> Result<Option<RoomId>, StorageError> {
        self.attempt()?;
        self.inner.room_for_handle(handle)
    }

    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, StorageError> {
        self.attempt()?;
        self.inner.is_member(room_id, identity)
    }

    fn add_member(
        &self,
        room_id: RoomId,
        identity: Identity,
        joined_at: u64,
    ) -> Result<(), StorageError> {
        self.attempt()?;
        self.inner.add_member(room_id, identity, joined_at)
    }

    fn members(&self, room_id: RoomId) -> Result<Vec<Identity>, StorageError> {
        self.attempt()?;
        self.inner.members(room_id)
    }

    fn append_message(
        &self,
        room_id: RoomId,
        index: u64,
        message: &Message,
    ) -> Result<(), StorageError> {
        self.attempt()?;
        self.inner.append_message(room_id, index, message)
    }

    fn message_count(&self, room_id: RoomId) -> Result<u64, StorageError> {
        self.attempt()?;
        self.inner.message_count(room_id)
    }

    fn load_messages(
        &self,
        room_id: RoomId,
        from: u64,
        limit: u64,
    ) -> Result<Vec<Message>, StorageError> {
        self.attempt()?;
        self.inner.load_messages(room_id, from, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn room(id: u64) -> Room {
        Room {
            id: RoomId::new(id),
            name: "chaos".to_string(),
            creator: Identity::from_bytes([1; 20]),
            encrypted_key: KeyHandle::new(vec![id as u8; 44]),
            created_at: 0,
            member_count: 1,
        }
    }

    #[test]
    fn test_chaotic_with_zero_failure_rate() {
        let chaotic = ChaoticStorage::new(MemoryStorage::new(), 0.0);

        for id in 1..=100 {
            chaotic.create_room(&room(id)).expect("should not fail with 0% rate");
        }

        assert_eq!(chaotic.room_count().expect("query failed"), 100);
        assert_eq!(chaotic.operation_count(), 101);
    }

    #[test]
    fn test_chaotic_with_100_failure_rate() {
        let chaotic = ChaoticStorage::new(MemoryStorage::new(), 1.0);

        assert!(chaotic.create_room(&room(1)).is_err());
        assert!(chaotic.room_count().is_err());
        assert!(chaotic.load_messages(RoomId::new(1), 0, 10).is_err());
        assert_eq!(chaotic.inner().room_count().expect("query failed"), 0);
    }

    #[test]
    fn test_chaotic_deterministic_with_seed() {
        let chaotic1 = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, 42);
        let chaotic2 = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, 42);

        for _ in 0..100 {
            let result1 = chaotic1.room_count();
            let result2 = chaotic2.room_count();
            assert_eq!(result1.is_ok(), result2.is_ok());
        }
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between 0.0 and 1.0")]
    fn test_chaotic_rejects_invalid_failure_rate() {
        let _chaotic = ChaoticStorage::new(MemoryStorage::new(), 1.5);
    }
}
