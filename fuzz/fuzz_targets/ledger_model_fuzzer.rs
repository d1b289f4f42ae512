//! Fuzz target for the ledger against its reference model
//!
//! Drives the real ledger and the model with the same operation sequence.
//!
//! # Strategy
//!
//! - Arbitrary operation sequences over a small world of actors and rooms
//! - Forged creates, replayed key handles, non-member sends and time jumps
//!   mixed with valid traffic
//!
//! # Invariants
//!
//! - Every operation returns the same result as the model
//! - Persisted state satisfies every standard invariant after every step
//! - Final observable state equals the model's

#![no_main]

use arbitrary::Arbitrary;
use ghostnet_harness::{InvariantRegistry, ModelLedger, Operation, SimLedger};
use ghostnet_ledger::MemoryStorage;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    /// Actor count 1-4
    actors: u8,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let num_actors = usize::from(scenario.actors % 4) + 1;
    let mut model = ModelLedger::new(num_actors);
    let mut real = SimLedger::new(scenario.seed, num_actors, MemoryStorage::new());
    let invariants = InvariantRegistry::standard();

    for (step, op) in scenario.operations.iter().take(64).enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);
        assert_eq!(actual, expected, "step {step}: {op:?}");

        let snapshot = real.snapshot().expect("memory storage does not fail");
        invariants.assert_all(&snapshot, &format!("step {step}: {op:?}"));
    }

    let observed = real.observable_state().expect("memory storage does not fail");
    assert_eq!(observed, model.observable_state());
});
