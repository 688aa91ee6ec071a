//! Transport callbacks.
//!
//! Every asynchronous outcome the transport reports is funneled into a single
//! [`TransportEvent`] type, consumed by
//! [`Orchestrator::handle`](crate::Orchestrator::handle). Outcomes correlate
//! with earlier commands solely by endpoint id; the orchestrator absorbs
//! events for ids it no longer tracks.

use bytes::Bytes;

use crate::endpoint::EndpointId;

/// Which capability call a [`TransportEvent::RequestFailed`] refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// `start_advertising` was rejected.
    Advertise,
    /// `start_discovery` was rejected.
    Discover,
    /// `request_connection` to this endpoint was rejected.
    Connect(EndpointId),
}

/// Asynchronous callback from the proximity transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A remote endpoint became visible during discovery.
    EndpointFound {
        /// Transport-assigned identifier.
        endpoint_id: EndpointId,
        /// Name the endpoint advertises under.
        display_name: String,
    },

    /// A previously found endpoint is no longer visible.
    EndpointLost {
        /// Transport-assigned identifier.
        endpoint_id: EndpointId,
    },

    /// A connection handshake has been initiated (by either side).
    ConnectionInitiated {
        /// Transport-assigned identifier.
        endpoint_id: EndpointId,
        /// Name the remote side presented.
        display_name: String,
    },

    /// Outcome of a handshake both sides previously accepted or rejected.
    ConnectionResult {
        /// Transport-assigned identifier.
        endpoint_id: EndpointId,
        /// True when the link was established.
        success: bool,
    },

    /// An established link dropped.
    Disconnected {
        /// Transport-assigned identifier.
        endpoint_id: EndpointId,
    },

    /// A payload arrived over an established link.
    PayloadReceived {
        /// Sender's transport-assigned identifier.
        endpoint_id: EndpointId,
        /// Raw payload bytes.
        payload: Bytes,
    },

    /// A fire-and-forget capability call was rejected.
    RequestFailed {
        /// Which call failed.
        request: RequestKind,
        /// Passthrough diagnostic text from the transport.
        reason: String,
    },
}
