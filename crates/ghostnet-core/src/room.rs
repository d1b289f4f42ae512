//! Rooms ("Ghosts") and the messages posted to them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{fhe::KeyHandle, identity::Identity};

/// Sequential room identifier, starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RoomId(u64);

impl RoomId {
    /// First id the registry assigns.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public view of a room.
///
/// Everything here is readable by anyone; the key is only present as an
/// encrypted handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room id
    pub id: RoomId,
    /// Human readable name (not validated by the ledger)
    pub name: String,
    /// Identity that created the room
    pub creator: Identity,
    /// Handle of the encrypted room key
    pub encrypted_key: KeyHandle,
    /// Ledger time of creation (seconds since Unix epoch)
    pub created_at: u64,
    /// Number of authorized identities
    pub member_count: u64,
}

/// One entry in a room's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identity that sent the message
    pub sender: Identity,
    /// Opaque ciphertext, stored as given
    pub ciphertext: String,
    /// Ledger time of the append (seconds since Unix epoch)
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        assert_eq!(RoomId::FIRST.get(), 1);
        assert_eq!(RoomId::FIRST, RoomId::new(1));
    }
}
