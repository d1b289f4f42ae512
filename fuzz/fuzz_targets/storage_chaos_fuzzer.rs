//! Fuzz target for the ledger under storage failures
//!
//! Runs operation sequences against `ChaoticStorage` at a fuzzed failure
//! rate.
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%)
//! - Arbitrary operation sequences under storage pressure
//!
//! # Invariants
//!
//! - Storage failures surface as errors, NEVER panics
//! - A failed operation leaves persisted state exactly as it was
//! - Persisted state satisfies every standard invariant after every step

#![no_main]

use arbitrary::Arbitrary;
use ghostnet_harness::{InvariantRegistry, LedgerSnapshot, Operation, SimLedger};
use ghostnet_ledger::{ChaoticStorage, MemoryStorage};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct ChaosScenario {
    seed: u64,
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: ChaosScenario| {
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let inner = MemoryStorage::new();
    let storage = ChaoticStorage::with_seed(inner.clone(), failure_rate, scenario.chaos_seed);
    let mut real = SimLedger::new(scenario.seed, 3, storage);
    let invariants = InvariantRegistry::standard();

    for op in scenario.operations.iter().take(64) {
        let before = LedgerSnapshot::capture(&inner).expect("memory storage does not fail");
        let result = real.apply(op);
        let after = LedgerSnapshot::capture(&inner).expect("memory storage does not fail");

        if !result.is_ok() {
            assert_eq!(before, after, "failed {op:?} changed state: {result:?}");
        }
        invariants.assert_all(&after, &format!("after {op:?}"));
    }
});
