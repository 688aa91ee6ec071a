//! Deterministic simulation harness for earshot session testing.
//!
//! In-memory stand-ins for the proximity transport plus a scenario runner
//! with mandatory oracle verification. No radio, no timers: every run is
//! reproducible, and fault schedules are either scripted or seeded.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod scenario;
pub mod sim_transport;

pub use faults::FaultPlan;
pub use scenario::{OracleFn, RunnableScenario, Scenario, World};
pub use sim_transport::{SimTransport, TransportCommand};
