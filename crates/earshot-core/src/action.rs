//! Declarative effects.
//!
//! Actions produced by the orchestrator for the runtime to execute. Transport
//! commands map one-to-one onto [`ProximityTransport`](crate::transport::ProximityTransport)
//! methods; [`Action::Notify`] carries an event for the UI boundary.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointId;

/// Boundary event for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Aggregate link status changed (any link up vs. none).
    ConnectionStatus {
        /// True while at least one link is established.
        connected: bool,
    },

    /// A chat message arrived from a peer.
    Message {
        /// Decoded message text.
        text: String,
    },

    /// Best-effort diagnostic line, passed through unstructured.
    Toast {
        /// Diagnostic text.
        text: String,
    },
}

/// Effect requested by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start broadcasting local presence under this name.
    StartAdvertising {
        /// Name to advertise under.
        display_name: String,
    },

    /// Stop broadcasting local presence.
    StopAdvertising,

    /// Start scanning for advertisers.
    StartDiscovery,

    /// Stop scanning.
    StopDiscovery,

    /// Request a connection to a discovered endpoint.
    RequestConnection {
        /// Local name presented to the peer.
        display_name: String,
        /// Target endpoint.
        endpoint_id: EndpointId,
    },

    /// Accept a handshake the transport reported as initiated.
    AcceptConnection {
        /// Endpoint whose handshake to accept.
        endpoint_id: EndpointId,
    },

    /// Send one payload to each listed endpoint.
    SendPayload {
        /// Established links to send over.
        endpoint_ids: Vec<EndpointId>,
        /// Raw payload bytes.
        payload: Bytes,
    },

    /// Tear down the link to one endpoint.
    Disconnect {
        /// Endpoint to disconnect.
        endpoint_id: EndpointId,
    },

    /// Tear down every link and pending handshake.
    StopAllEndpoints,

    /// Deliver a boundary event to the UI layer.
    Notify(Notice),
}
