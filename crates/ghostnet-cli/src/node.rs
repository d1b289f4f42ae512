//! A single-process GhostNet node over a data directory.
//!
//! The directory holds the redb ledger and the coprocessor secret. Every
//! command opens the node, runs against it and drops it, so state lives only
//! on disk between invocations.

use std::{fs, path::Path};

use clap::Subcommand;
use ed25519_dalek::SigningKey;
use ghostnet_client::{ClientError, GhostClient};
use ghostnet_core::{Environment, GhostError, GhostLedger, RoomId};
use ghostnet_crypto::Coprocessor;
use ghostnet_ledger::{Gateway, GhostNet, LedgerConfig, RedbStorage, SystemEnv};
use sha2::{Digest, Sha256};

use crate::error::NodeError;

/// Ledger database file inside the data directory.
pub const DATABASE_FILE: &str = "ghostnet.redb";

/// Coprocessor secret file inside the data directory.
pub const SECRET_FILE: &str = "coprocessor.key";

/// Domain separator for development identities.
const DEV_IDENTITY_LABEL: &[u8] = b"ghostnet/dev-identity/";

/// Default page size for `read`.
const DEFAULT_READ_LIMIT: u64 = 20;

/// Node commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the ledger contract address and the caller's identity
    Address,

    /// Create a room with a fresh (or given) 6-8 digit key
    Create {
        /// Room name
        #[arg(long)]
        name: String,
        /// Room key; generated when omitted
        #[arg(long)]
        key: Option<u32>,
    },

    /// Join a room
    Join {
        /// Room id
        #[arg(long)]
        id: u64,
    },

    /// Show a room and, for members, its decrypted key
    Info {
        /// Room id
        #[arg(long)]
        id: u64,
    },

    /// Encrypt and post a message, or post a ciphertext as given
    Send {
        /// Room id
        #[arg(long)]
        id: u64,
        /// Message text, encrypted with the room key
        #[arg(long, required_unless_present = "ciphertext", conflicts_with = "ciphertext")]
        message: Option<String>,
        /// Pre-encrypted ciphertext, posted verbatim
        #[arg(long)]
        ciphertext: Option<String>,
    },

    /// Read messages, decrypting them when the caller holds the key
    Read {
        /// Room id
        #[arg(long)]
        id: u64,
        /// First message index
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Maximum number of messages
        #[arg(long, default_value_t = DEFAULT_READ_LIMIT)]
        limit: u64,
    },

    /// List every room
    Rooms,
}

/// Signing key for a named development identity.
///
/// `SHA-256("ghostnet/dev-identity/" || name)`. Anyone who knows the name
/// can act as it; this is for local experimentation only.
pub fn dev_signing_key(name: &str) -> SigningKey {
    let mut hasher = Sha256::new();
    hasher.update(DEV_IDENTITY_LABEL);
    hasher.update(name.as_bytes());
    SigningKey::from_bytes(&hasher.finalize().into())
}

/// Ledger, coprocessor and gateway opened from a data directory.
pub struct Node {
    env: SystemEnv,
    coprocessor: Coprocessor<SystemEnv>,
    ledger: GhostNet<SystemEnv, RedbStorage, Coprocessor<SystemEnv>>,
    gateway: Gateway<SystemEnv, RedbStorage>,
}

impl Node {
    /// Open (or initialize) the node stored in `data_dir`.
    ///
    /// # Errors
    ///
    /// - `NodeError::Io` if the directory or secret cannot be read or written
    /// - `NodeError::InvalidSecret` if the stored secret is not 32 bytes
    /// - `NodeError::Storage` if the database cannot be opened
    pub fn open(data_dir: &Path) -> Result<Self, NodeError> {
        fs::create_dir_all(data_dir).map_err(NodeError::io(data_dir))?;

        let env = SystemEnv::new();
        let secret = load_or_create_secret(&env, &data_dir.join(SECRET_FILE))?;
        let storage = RedbStorage::open(data_dir.join(DATABASE_FILE))?;

        let coprocessor = Coprocessor::new(env, &secret);
        let ledger = GhostNet::new(env, storage, coprocessor.clone(), LedgerConfig::default());
        let gateway = ledger.gateway(coprocessor.clone());

        tracing::debug!(data_dir = %data_dir.display(), "Opened node");
        Ok(Self { env, coprocessor, ledger, gateway })
    }

    /// Client for the named development identity.
    pub fn client(&self, identity: &str) -> GhostClient<SystemEnv> {
        GhostClient::new(self.env, dev_signing_key(identity))
    }

    /// Run `command` as `identity` and render its output, one line per item.
    ///
    /// # Errors
    ///
    /// Propagates client and ledger errors; see [`NodeError`].
    pub fn execute(&mut self, identity: &str, command: Command) -> Result<String, NodeError> {
        let mut client = self.client(identity);
        let mut lines = Vec::new();

        match command {
            Command::Address => {
                lines.push(format!("contract: {}", self.ledger.contract_address()));
                lines.push(format!("identity: {}", client.identity()));
            },
            Command::Create { name, key } => {
                let key = key.unwrap_or_else(|| client.generate_room_key());
                let room_id = client.create_room(&mut self.ledger, &self.coprocessor, &name, key)?;
                lines.push(format!("created room {room_id} with key {key}"));
            },
            Command::Join { id } => {
                let room_id = RoomId::new(id);
                client.join(&mut self.ledger, room_id)?;
                lines.push(format!("joined room {room_id}"));
            },
            Command::Info { id } => {
                let room = self.ledger.get_room(RoomId::new(id))?;
                lines.push(format!("room:     {}", room.id));
                lines.push(format!("name:     {}", room.name));
                lines.push(format!("creator:  {}", room.creator));
                lines.push(format!("created:  {}", room.created_at));
                lines.push(format!("members:  {}", room.member_count));
                lines.push(format!("messages: {}", self.ledger.count(room.id)?));

                match client.decrypt_room_key(&self.ledger, &self.gateway, room.id) {
                    Ok(key) => lines.push(format!("key:      {key}")),
                    Err(ClientError::Ledger(GhostError::AuthorizationDenied(reason))) => {
                        lines.push(format!("key:      unavailable ({reason})"));
                    },
                    Err(e) => return Err(e.into()),
                }
            },
            Command::Send { id, message, ciphertext } => {
                let room_id = RoomId::new(id);
                let index = match (message, ciphertext) {
                    (_, Some(ciphertext)) => {
                        self.ledger.send(client.identity(), room_id, ciphertext)?.output
                    },
                    (Some(message), None) => {
                        // Non-members are refused by the ledger, not the gateway
                        let identity = client.identity();
                        if !self.ledger.is_member(room_id, identity)? {
                            return Err(GhostError::NotMember { room_id, identity }.into());
                        }
                        client.decrypt_room_key(&self.ledger, &self.gateway, room_id)?;
                        client.send_message(&mut self.ledger, room_id, &message)?
                    },
                    (None, None) => return Err(ClientError::BlankMessage.into()),
                };
                lines.push(format!("sent message {index} to room {room_id}"));
            },
            Command::Read { id, offset, limit } => {
                let room_id = RoomId::new(id);
                if self.ledger.is_member(room_id, client.identity())? {
                    client.decrypt_room_key(&self.ledger, &self.gateway, room_id)?;
                }

                for message in client.read_messages(&self.ledger, room_id, offset, limit)? {
                    let text = message.plaintext.as_deref().unwrap_or(&message.ciphertext);
                    lines.push(format!(
                        "[{}] {} {}: {}",
                        message.index, message.timestamp, message.sender, text
                    ));
                }
            },
            Command::Rooms => {
                for room in self.ledger.get_all_rooms()? {
                    lines.push(format!(
                        "{}\t{}\t{} members\tcreated by {}",
                        room.id, room.name, room.member_count, room.creator
                    ));
                }
            },
        }

        Ok(lines.join("\n"))
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("contract", &self.ledger.contract_address())
            .finish_non_exhaustive()
    }
}

/// Read the 32-byte coprocessor secret, generating it on first use.
fn load_or_create_secret(env: &SystemEnv, path: &Path) -> Result<[u8; 32], NodeError> {
    if path.exists() {
        let bytes = fs::read(path).map_err(NodeError::io(path))?;
        return <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| NodeError::InvalidSecret { path: path.to_path_buf(), len: bytes.len() });
    }

    let secret = env.random_array32();
    fs::write(path, secret).map_err(NodeError::io(path))?;
    tracing::info!(path = %path.display(), "Generated coprocessor secret");

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_identities_are_stable_per_name() {
        assert_eq!(dev_signing_key("alice").to_bytes(), dev_signing_key("alice").to_bytes());
        assert_ne!(dev_signing_key("alice").to_bytes(), dev_signing_key("bob").to_bytes());
    }

    #[test]
    fn secret_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SECRET_FILE);

        let first = load_or_create_secret(&SystemEnv::new(), &path).unwrap();
        let second = load_or_create_secret(&SystemEnv::new(), &path).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&path).unwrap().len(), 32);
    }

    #[test]
    fn truncated_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SECRET_FILE);
        fs::write(&path, [7u8; 5]).unwrap();

        let err = load_or_create_secret(&SystemEnv::new(), &path).unwrap_err();
        assert!(matches!(err, NodeError::InvalidSecret { len: 5, .. }));
    }
}
