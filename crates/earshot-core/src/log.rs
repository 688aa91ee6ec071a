//! Session transcript.
//!
//! The transcript is ordered newest-first so UI layers can render the most
//! recent message without scanning. It is append-only for the duration of a
//! session and cleared exactly once, when the session ends.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Whether a transcript entry was sent by the local node or received from a
/// peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sent by the local node.
    Sent,
    /// Received from a remote peer.
    Received,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sent or received.
    pub direction: Direction,
    /// Message text.
    pub text: String,
}

/// Newest-first message transcript for one session.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
}

impl MessageLog {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message sent by the local node.
    pub fn record_sent(&mut self, text: impl Into<String>) {
        self.entries.push_front(LogEntry { direction: Direction::Sent, text: text.into() });
    }

    /// Record a message received from a peer.
    pub fn record_received(&mut self, text: impl Into<String>) {
        self.entries.push_front(LogEntry { direction: Direction::Received, text: text.into() });
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no messages have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the whole transcript. Called once, on session end.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
