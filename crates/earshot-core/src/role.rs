//! Orchestrator role.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of the local node within a proximity session.
///
/// Exactly one role is active at a time. `Unknown` is both the initial state
/// (before going online) and the terminal state (after shutdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// No session active.
    Unknown,
    /// Scanning for advertisers and initiating connections.
    Discovering,
    /// Broadcasting local presence for discoverers to find.
    Advertising,
    /// At least one established link.
    Connected,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Unknown => "unknown",
            Role::Discovering => "discovering",
            Role::Advertising => "advertising",
            Role::Connected => "connected",
        };
        f.write_str(name)
    }
}
