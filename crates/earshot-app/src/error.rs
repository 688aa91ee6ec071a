//! Handle-side error type.

use thiserror::Error;

/// Errors surfaced by [`crate::Session`] methods.
///
/// The runtime itself never fails: transport rejections and anomalous events
/// are absorbed by the orchestrator. The only thing a handle can observe is
/// that the runtime task is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The runtime task has exited, usually after going offline.
    #[error("session closed")]
    Closed,
}
