//! Scenario tests with mandatory oracle verification.
//!
//! A [`Scenario`] declares actors and faults; [`World`] wires their
//! orchestrators together through an in-memory radio and delivers events in
//! deterministic FIFO order. The oracle is the only way to run a scenario, so
//! every scenario test verifies final state rather than merely completing.

mod builder;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::World;

/// Verification function run against the final world state.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
