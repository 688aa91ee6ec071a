//! In-memory transport double.
//!
//! Records every command a session runtime issues and rejects the ones the
//! [`FaultPlan`] says to reject. It produces no callbacks of its own; tests
//! inject [`earshot_core::TransportEvent`]s through the event channel they
//! handed to the session, which keeps full control of timing and ordering.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use earshot_core::{EndpointId, ProximityTransport, TransportError};

use crate::faults::FaultPlan;

/// One command issued against the transport, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Advertising was started under this name.
    StartAdvertising {
        /// Name broadcast to discoverers.
        display_name: String,
    },
    /// Advertising was stopped.
    StopAdvertising,
    /// Discovery was started.
    StartDiscovery,
    /// Discovery was stopped.
    StopDiscovery,
    /// A connection was requested.
    RequestConnection {
        /// Local name sent with the handshake.
        display_name: String,
        /// Requested endpoint.
        endpoint_id: EndpointId,
    },
    /// An incoming handshake was accepted.
    AcceptConnection {
        /// Accepted endpoint.
        endpoint_id: EndpointId,
    },
    /// An incoming handshake was rejected.
    RejectConnection {
        /// Rejected endpoint.
        endpoint_id: EndpointId,
    },
    /// A payload was sent.
    SendPayload {
        /// Targeted endpoints.
        endpoint_ids: Vec<EndpointId>,
        /// Raw bytes.
        payload: Bytes,
    },
    /// One endpoint was disconnected.
    Disconnect {
        /// Disconnected endpoint.
        endpoint_id: EndpointId,
    },
    /// Every endpoint was disconnected.
    StopAllEndpoints,
}

#[derive(Debug, Default)]
struct Inner {
    issued: Vec<TransportCommand>,
    faults: FaultPlan,
}

/// Recording [`ProximityTransport`] implementation.
///
/// Clones share the same command log and fault plan, so a test can keep one
/// handle while the session runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct SimTransport {
    inner: Arc<Mutex<Inner>>,
}

impl SimTransport {
    /// A transport that accepts every command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects commands per the fault plan.
    #[must_use]
    pub fn with_faults(faults: FaultPlan) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { issued: Vec::new(), faults })) }
    }

    /// Every command issued so far, in order.
    #[must_use]
    pub fn issued(&self) -> Vec<TransportCommand> {
        self.lock().issued.clone()
    }

    /// True when a command matching the predicate was issued.
    pub fn has_issued(&self, predicate: impl Fn(&TransportCommand) -> bool) -> bool {
        self.lock().issued.iter().any(predicate)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, command: TransportCommand) {
        self.lock().issued.push(command);
    }
}

#[async_trait]
impl ProximityTransport for SimTransport {
    async fn start_advertising(&mut self, display_name: &str) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner
            .issued
            .push(TransportCommand::StartAdvertising { display_name: display_name.to_owned() });
        match inner.faults.take_advertise_rejection() {
            Some(reason) => Err(TransportError::new(reason)),
            None => Ok(()),
        }
    }

    async fn stop_advertising(&mut self) {
        self.record(TransportCommand::StopAdvertising);
    }

    async fn start_discovery(&mut self) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.issued.push(TransportCommand::StartDiscovery);
        match inner.faults.take_discovery_rejection() {
            Some(reason) => Err(TransportError::new(reason)),
            None => Ok(()),
        }
    }

    async fn stop_discovery(&mut self) {
        self.record(TransportCommand::StopDiscovery);
    }

    async fn request_connection(
        &mut self,
        display_name: &str,
        endpoint_id: &EndpointId,
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.issued.push(TransportCommand::RequestConnection {
            display_name: display_name.to_owned(),
            endpoint_id: endpoint_id.clone(),
        });
        match inner.faults.take_connect_rejection() {
            Some(reason) => Err(TransportError::new(reason)),
            None => Ok(()),
        }
    }

    async fn accept_connection(&mut self, endpoint_id: &EndpointId) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.issued.push(TransportCommand::AcceptConnection { endpoint_id: endpoint_id.clone() });
        match inner.faults.take_accept_rejection() {
            Some(reason) => Err(TransportError::new(reason)),
            None => Ok(()),
        }
    }

    async fn reject_connection(&mut self, endpoint_id: &EndpointId) -> Result<(), TransportError> {
        self.record(TransportCommand::RejectConnection { endpoint_id: endpoint_id.clone() });
        Ok(())
    }

    async fn send_payload(
        &mut self,
        endpoint_ids: &[EndpointId],
        payload: Bytes,
    ) -> Result<(), TransportError> {
        self.record(TransportCommand::SendPayload {
            endpoint_ids: endpoint_ids.to_vec(),
            payload,
        });
        Ok(())
    }

    async fn disconnect(&mut self, endpoint_id: &EndpointId) {
        self.record(TransportCommand::Disconnect { endpoint_id: endpoint_id.clone() });
    }

    async fn stop_all_endpoints(&mut self) {
        self.record(TransportCommand::StopAllEndpoints);
    }
}
