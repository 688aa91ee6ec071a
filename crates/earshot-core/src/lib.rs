//! Earshot core logic
//!
//! Pure state machine logic for the Earshot proximity-chat protocol,
//! completely decoupled from I/O. This enables deterministic testing of the
//! full connection lifecycle without a radio.
//!
//! # Architecture
//!
//! Protocol logic in this crate is implemented as a deterministic state
//! machine that is isolated from I/O, time, and scheduling. All external
//! effects are supplied explicitly by the caller as [`TransportEvent`]s.
//!
//! State transitions produce declarative [`Action`]s that describe intended
//! effects rather than executing them directly. A runtime or test harness is
//! responsible for interpreting and executing these actions against a
//! [`ProximityTransport`].
//!
//! This separation keeps orchestration correctness independent of execution
//! concerns and allows the same code to be reused across the production
//! session runtime, deterministic unit tests, and simulated multi-node
//! scenarios with fault injection.
//!
//! # Components
//!
//! - [`orchestrator`]: Role state machine and connection orchestration
//! - [`roster`]: Disjoint discovered/pending/connected endpoint bookkeeping
//! - [`log`]: Newest-first session transcript
//! - [`identity`]: Local display name and role convention
//! - [`transport`]: Proximity transport abstraction (commands)
//! - [`event`]: Transport callbacks, funneled into a single event type
//! - [`action`]: Declarative effects returned by the orchestrator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod endpoint;
pub mod event;
pub mod identity;
pub mod log;
pub mod orchestrator;
pub mod role;
pub mod roster;
pub mod transport;

pub use action::{Action, Notice};
pub use endpoint::{Endpoint, EndpointId};
pub use event::{RequestKind, TransportEvent};
pub use identity::Identity;
pub use log::{Direction, LogEntry, MessageLog};
pub use orchestrator::Orchestrator;
pub use role::Role;
pub use roster::Roster;
pub use transport::{ProximityTransport, TransportError};
