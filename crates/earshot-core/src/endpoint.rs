//! Remote endpoint identification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque transport-assigned endpoint identifier.
///
/// Valid only for the lifetime of the discovery or advertising session that
/// produced it. Ordered so that bookkeeping iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointId(String);

impl EndpointId {
    /// Wrap a transport-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EndpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A discovered or connected remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Transport-assigned identifier.
    pub id: EndpointId,
    /// Human-readable name the peer advertises under.
    pub display_name: String,
}

impl Endpoint {
    /// Create an endpoint record.
    pub fn new(id: impl Into<EndpointId>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into() }
    }
}
