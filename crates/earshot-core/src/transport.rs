//! Proximity transport abstraction.
//!
//! Abstracts over proximity radios (BLE/WiFi-style advertise, discover,
//! connect, send). Production wraps a platform SDK, tests use the in-memory
//! simulation from the harness crate.
//!
//! Commands are fire-and-forget: a returned `Ok` only means the transport
//! accepted the call. Outcomes arrive later as
//! [`TransportEvent`](crate::event::TransportEvent)s, delivered over a
//! channel the runtime owns, correlated solely by endpoint id. Methods that
//! return a [`TransportError`] may also be rejected synchronously; the
//! runtime feeds those rejections back into the orchestrator as
//! [`RequestFailed`](crate::event::TransportEvent::RequestFailed) events, so
//! the state machine sees one failure path regardless of timing.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::endpoint::EndpointId;

/// Diagnostic a transport returns when rejecting a capability call.
///
/// Deliberately unstructured: the text is surfaced to the UI as a toast and
/// never matched on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransportError {
    reason: String,
}

impl TransportError {
    /// Wrap a transport-provided diagnostic.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// The passthrough diagnostic text.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Abstract proximity transport (commands only).
///
/// One instance is owned exclusively by the session runtime, which executes
/// orchestrator [`Action`](crate::action::Action)s against it.
#[async_trait]
pub trait ProximityTransport: Send + 'static {
    /// Start broadcasting local presence under `display_name`.
    async fn start_advertising(&mut self, display_name: &str) -> Result<(), TransportError>;

    /// Stop broadcasting local presence.
    async fn stop_advertising(&mut self);

    /// Start scanning for advertisers.
    async fn start_discovery(&mut self) -> Result<(), TransportError>;

    /// Stop scanning.
    async fn stop_discovery(&mut self);

    /// Request a connection to a discovered endpoint, presenting
    /// `display_name` to the remote side.
    async fn request_connection(
        &mut self,
        display_name: &str,
        endpoint_id: &EndpointId,
    ) -> Result<(), TransportError>;

    /// Accept a handshake the transport reported as initiated.
    async fn accept_connection(&mut self, endpoint_id: &EndpointId) -> Result<(), TransportError>;

    /// Reject a handshake the transport reported as initiated.
    async fn reject_connection(&mut self, endpoint_id: &EndpointId) -> Result<(), TransportError>;

    /// Send one payload to each listed endpoint. Fire-and-forget, no
    /// delivery confirmation.
    async fn send_payload(
        &mut self,
        endpoint_ids: &[EndpointId],
        payload: Bytes,
    ) -> Result<(), TransportError>;

    /// Tear down the link to one endpoint.
    async fn disconnect(&mut self, endpoint_id: &EndpointId);

    /// Tear down every link and pending handshake.
    async fn stop_all_endpoints(&mut self);
}
