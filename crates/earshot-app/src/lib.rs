//! Session runtime for earshot.
//!
//! Wraps the pure [`earshot_core::Orchestrator`] in a tokio task: UI handles
//! send commands in, transport callbacks flow in as events, and boundary
//! notices fan out over a broadcast channel. The same orchestration code runs
//! against a production transport and the in-memory simulation.
//!
//! # Components
//!
//! - [`Session`]: cloneable handle used by UI layers
//! - [`SessionSnapshot`]: point-in-time copy of role, peers and transcript
//! - [`SessionError`]: handle-side failures (the runtime absorbs the rest)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod error;
mod runtime;
mod session;

pub use error::SessionError;
pub use session::{Session, SessionSnapshot};
