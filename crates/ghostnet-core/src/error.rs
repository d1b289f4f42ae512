//! Error types for the GhostNet ledger protocol.
//!
//! Every failure a ledger call or the decryption oracle can report is a
//! distinct variant, so clients can tell "already a member" apart from "room
//! does not exist" without parsing strings.

use thiserror::Error;

use crate::{identity::Identity, room::RoomId};

/// Failures surfaced by the ledger and the decryption oracle.
///
/// All ledger failures are atomic: no state is changed by a call that returns
/// an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GhostError {
    /// Unknown room id.
    #[error("room not found: {0}")]
    NotFound(RoomId),

    /// Handle is not registered to any room.
    #[error("encrypted key handle not registered")]
    UnknownHandle,

    /// Caller is already in the room's authorized identities.
    #[error("{identity} is already a member of room {room_id}")]
    AlreadyMember {
        /// Room the join targeted
        room_id: RoomId,
        /// Identity that attempted to join again
        identity: Identity,
    },

    /// Caller is not in the room's authorized identities.
    #[error("{identity} is not a member of room {room_id}")]
    NotMember {
        /// Room the send targeted
        room_id: RoomId,
        /// Identity that attempted to send
        identity: Identity,
    },

    /// Encryption proof failed verification at room creation.
    #[error("invalid input proof: {0}")]
    InvalidProof(String),

    /// Decryption oracle refused the request.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(DenialReason),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl GhostError {
    /// Returns true if this error reflects caller input rather than a backend
    /// fault.
    ///
    /// Caller errors are deterministic: retrying the same call against the
    /// same ledger state fails the same way.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// Why the decryption oracle refused a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Signature does not verify against the signer key.
    #[error("signature verification failed")]
    BadSignature,

    /// Signer key does not derive to the requester identity.
    #[error("signer {signer} does not match requester {requester}")]
    SignerMismatch {
        /// Identity derived from the signing key
        signer: Identity,
        /// Identity named in the request
        requester: Identity,
    },

    /// The ledger's contract address is not listed in the statement.
    #[error("contract not covered by authorization")]
    ContractNotAuthorized,

    /// Authorization validity window has not started yet.
    #[error("authorization not valid before {start}")]
    NotYetValid {
        /// First valid second
        start: u64,
    },

    /// Authorization validity window has passed.
    #[error("authorization expired at {expired_at}")]
    Expired {
        /// First invalid second
        expired_at: u64,
    },

    /// Duration outside the accepted range.
    #[error("invalid authorization duration: {days} days")]
    InvalidDuration {
        /// Requested duration
        days: u64,
    },

    /// Ephemeral public key is a low-order point.
    #[error("ephemeral public key rejected")]
    InvalidEphemeralKey,

    /// Requester is not in the room's authorized identities.
    #[error("{identity} is not authorized for room {room_id}")]
    NotAuthorized {
        /// Room owning the handle
        room_id: RoomId,
        /// Requester identity
        identity: Identity,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_not_caller_errors() {
        assert!(!GhostError::Storage("disk full".to_string()).is_caller_error());
    }

    #[test]
    fn protocol_rejections_are_caller_errors() {
        let identity = Identity::from_bytes([7; 20]);
        let room_id = RoomId::new(1);

        assert!(GhostError::NotFound(room_id).is_caller_error());
        assert!(GhostError::AlreadyMember { room_id, identity }.is_caller_error());
        assert!(GhostError::NotMember { room_id, identity }.is_caller_error());
        assert!(GhostError::InvalidProof("bad mac".to_string()).is_caller_error());
        assert!(GhostError::AuthorizationDenied(DenialReason::BadSignature).is_caller_error());
    }

    #[test]
    fn messages_name_the_room() {
        let err = GhostError::NotFound(RoomId::new(42));
        insta::assert_snapshot!(err.to_string(), @"room not found: 42");
    }
}
