//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `RoomNotFound`: Mutation targets a room that was never created
//! - `Conflict`: Room id or message index out of sequence
//! - `DuplicateHandle` / `DuplicateMember`: Uniqueness violated
//! - `Serialization`: Failed to encode/decode data
//! - `Io`: Underlying storage system errors

use ghostnet_core::{GhostError, Identity, RoomId};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Room does not exist
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// Sequence conflict (gap or reuse)
    ///
    /// Raised when a room id is not the next dense id, or a message index is
    /// not the current length of the room's log.
    #[error("sequence conflict: expected {expected}, got {got}")]
    Conflict {
        /// Expected id or index
        expected: u64,
        /// Provided id or index
        got: u64,
    },

    /// Handle already backs another room
    #[error("key handle already registered to room {0}")]
    DuplicateHandle(RoomId),

    /// Identity already in the room's access list
    #[error("{identity} already authorized for room {room_id}")]
    DuplicateMember {
        /// Room
        room_id: RoomId,
        /// Identity
        identity: Identity,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<StorageError> for GhostError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RoomNotFound(room_id) => Self::NotFound(room_id),
            StorageError::DuplicateHandle(_) => {
                Self::InvalidProof("key handle already registered".to_string())
            },
            StorageError::DuplicateMember { room_id, identity } => {
                Self::AlreadyMember { room_id, identity }
            },
            other @ (StorageError::Conflict { .. }
            | StorageError::Serialization(_)
            | StorageError::Io(_)) => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniqueness_violations_map_to_caller_errors() {
        let room_id = RoomId::new(3);
        let identity = Identity::from_bytes([1; 20]);

        let err: GhostError = StorageError::DuplicateMember { room_id, identity }.into();
        assert_eq!(err, GhostError::AlreadyMember { room_id, identity });

        let err: GhostError = StorageError::DuplicateHandle(room_id).into();
        assert!(matches!(err, GhostError::InvalidProof(_)));
    }

    #[test]
    fn backend_failures_map_to_storage() {
        let err: GhostError = StorageError::Io("disk full".to_string()).into();
        insta::assert_snapshot!(err.to_string(), @"storage error: I/O error: disk full");
        assert!(!err.is_caller_error());
    }
}
