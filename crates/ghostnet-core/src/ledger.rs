//! The ledger's public contract.
//!
//! [`GhostLedger`] is the full set of entry points a client can call,
//! independent of transport. Writes take `&mut self`: the ledger executes them
//! one at a time, each committing fully or not at all. Reads take `&self` and
//! observe the latest committed state.

use crate::{
    error::GhostError,
    event::Receipt,
    fhe::{InputProof, KeyHandle},
    identity::{ContractAddress, Identity},
    room::{Message, Room, RoomId},
};

/// Entry points of the encrypted-room ledger.
pub trait GhostLedger {
    /// Address that handles and authorizations must be bound to.
    fn contract_address(&self) -> ContractAddress;

    /// Register a room whose key is the encrypted value behind `handle`.
    ///
    /// The caller becomes the creator and first member.
    ///
    /// # Errors
    ///
    /// - `GhostError::InvalidProof` if the proof does not bind `handle` to
    ///   `caller` and this contract, or the handle already backs a room
    fn create_room(
        &mut self,
        caller: Identity,
        name: &str,
        handle: KeyHandle,
        proof: InputProof,
    ) -> Result<Receipt<RoomId>, GhostError>;

    /// Public view of one room.
    fn get_room(&self, room_id: RoomId) -> Result<Room, GhostError>;

    /// Every room, id ascending.
    fn get_all_rooms(&self) -> Result<Vec<Room>, GhostError>;

    /// Whether `identity` is authorized for the room.
    fn is_member(&self, room_id: RoomId, identity: Identity) -> Result<bool, GhostError>;

    /// Add `caller` to the room's members.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    /// - `GhostError::AlreadyMember` if the caller is already authorized
    fn join(&mut self, caller: Identity, room_id: RoomId) -> Result<Receipt<()>, GhostError>;

    /// Append a ciphertext to the room's log, returning its index.
    ///
    /// # Errors
    ///
    /// - `GhostError::NotFound` if the room does not exist
    /// - `GhostError::NotMember` if the caller is not authorized
    fn send(
        &mut self,
        caller: Identity,
        room_id: RoomId,
        ciphertext: String,
    ) -> Result<Receipt<u64>, GhostError>;

    /// Number of messages in the room's log.
    fn count(&self, room_id: RoomId) -> Result<u64, GhostError>;

    /// Messages `[offset, offset + limit)` in append order.
    ///
    /// Returns fewer than `limit` entries (possibly none) when the log is
    /// shorter.
    fn list(&self, room_id: RoomId, offset: u64, limit: u64) -> Result<Vec<Message>, GhostError>;
}
