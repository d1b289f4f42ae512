//! Fuzz target for the decryption gateway
//!
//! Hardens `user_decrypt` against malformed and hostile requests.
//!
//! # Strategy
//!
//! - Signer: creator, member, outsider
//! - Requester: matching the signer or another identity
//! - Statement: arbitrary start, duration, contracts and ephemeral key
//! - Signature: valid, corrupted, or from an arbitrary signer key
//! - Handle: the room's handle, or arbitrary bytes
//!
//! # Invariants
//!
//! - The gateway NEVER panics
//! - A sealed reply is only produced when every check passes: the signature
//!   verifies, the signer is the requester, the contract is covered, now is
//!   inside the window, the duration is in range, and the requester is
//!   authorized for the handle
//! - A successful reply opens to the room key

#![no_main]

use arbitrary::Arbitrary;
use ed25519_dalek::SigningKey;
use ghostnet_core::{
    DecryptAuthorization, DecryptionOracle, EncryptionCapability, GhostLedger, Identity, KeyHandle,
    RoomId, UserDecryptRequest,
};
use ghostnet_crypto::{Coprocessor, EphemeralKeypair, open_sealed, sign_authorization};
use ghostnet_harness::SimEnv;
use ghostnet_ledger::{DEFAULT_MAX_DURATION_DAYS, GhostNet, LedgerConfig, MemoryStorage};
use libfuzzer_sys::fuzz_target;

const ROOM_KEY: u32 = 31_415_926;

#[derive(Debug, Clone, Arbitrary)]
struct Request {
    signer: u8,
    requester_matches: bool,
    ephemeral_seed: [u8; 32],
    /// Offset of the window start from now, in seconds
    start_offset: i32,
    duration_days: u16,
    cover_contract: bool,
    extra_contracts: Vec<[u8; 20]>,
    tamper: Tamper,
    handle: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Tamper {
    None,
    FlipSignatureBit(u8),
    ReplaceSignerKey([u8; 32]),
    ExtendDuration,
}

fuzz_target!(|request: Request| {
    let env = SimEnv::with_seed(1);
    let coprocessor = Coprocessor::new(env.clone(), &[0x5a; 32]);
    let mut ledger = GhostNet::new(
        env.clone(),
        MemoryStorage::new(),
        coprocessor.clone(),
        LedgerConfig::default(),
    );

    let keys = [1u8, 2, 3].map(|seed| SigningKey::from_bytes(&[seed; 32]));
    let ids = keys.each_ref().map(|key| Identity::from_verifying_key(&key.verifying_key()));

    let contract = ledger.contract_address();
    let input = coprocessor.encrypt_input(contract, ids[0], ROOM_KEY);
    let room_handle = input.handle.clone();
    ledger.create_room(ids[0], "fuzz", input.handle, input.proof).expect("valid create");
    ledger.join(ids[1], RoomId::new(1)).expect("first join");

    let signer_idx = usize::from(request.signer % 3);
    let signer = &keys[signer_idx];
    let requester =
        if request.requester_matches { ids[signer_idx] } else { ids[(signer_idx + 1) % 3] };

    let now = env.now();
    let start_timestamp = now.saturating_add_signed(i64::from(request.start_offset));
    let mut contract_addresses: Vec<_> = request
        .extra_contracts
        .iter()
        .take(4)
        .map(|bytes| ghostnet_core::ContractAddress::from_bytes(*bytes))
        .collect();
    if request.cover_contract {
        contract_addresses.push(contract);
    }

    let keypair = EphemeralKeypair::from_bytes(request.ephemeral_seed);
    let statement = DecryptAuthorization {
        ephemeral_public_key: keypair.public_key(),
        contract_addresses,
        start_timestamp,
        duration_days: u64::from(request.duration_days),
    };
    let mut authorization = sign_authorization(signer, statement);

    let mut signature_valid = true;
    match request.tamper {
        Tamper::None => {},
        Tamper::FlipSignatureBit(bit) => {
            authorization.signature[usize::from(bit % 64)] ^= 1 << (bit % 8);
            signature_valid = false;
        },
        Tamper::ReplaceSignerKey(key) => {
            signature_valid = key == authorization.signer_key;
            authorization.signer_key = key;
        },
        Tamper::ExtendDuration => {
            authorization.statement.duration_days += 1;
            signature_valid = false;
        },
    }

    let handle = request.handle.map_or(room_handle.clone(), KeyHandle::new);
    let is_room_handle = handle == room_handle;
    let request = UserDecryptRequest { handle, authorization, requester };
    let statement = &request.authorization.statement;

    let Ok(sealed) = ledger.gateway(coprocessor).user_decrypt(&request) else {
        return;
    };

    assert!(signature_valid, "accepted a bad signature");
    assert_eq!(requester, ids[signer_idx], "accepted signer/requester mismatch");
    assert!(statement.covers(contract), "accepted uncovered contract");
    assert!(statement.start_timestamp <= now, "accepted before window start");
    assert!(now < statement.expires_at(), "accepted after expiry");
    assert!(
        (1..=DEFAULT_MAX_DURATION_DAYS).contains(&statement.duration_days),
        "accepted duration {}",
        statement.duration_days
    );
    assert!(is_room_handle, "released an unregistered handle");
    assert!(signer_idx < 2, "released the key to an outsider");
    assert_eq!(open_sealed(&sealed, &keypair).ok(), Some(ROOM_KEY));
});
