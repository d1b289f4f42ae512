//! Ledger and gateway configuration.

use ghostnet_core::ContractAddress;

/// Address the ledger runs under when none is configured.
///
/// `"ghostnet-ledger-v1"` padded with zeros to 20 bytes.
pub const DEFAULT_CONTRACT_ADDRESS: ContractAddress =
    ContractAddress::from_bytes(*b"ghostnet-ledger-v1\0\0");

/// Longest authorization the gateway accepts, in days.
pub const DEFAULT_MAX_DURATION_DAYS: u64 = 365;

/// Ledger configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Context that key handles must be bound to.
    pub contract_address: ContractAddress,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { contract_address: DEFAULT_CONTRACT_ADDRESS }
    }
}

/// Decryption gateway configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Contract that authorizations must list.
    pub contract_address: ContractAddress,

    /// Upper bound on `duration_days` in an authorization.
    pub max_duration_days: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            max_duration_days: DEFAULT_MAX_DURATION_DAYS,
        }
    }
}
