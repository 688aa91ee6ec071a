//! Public session handle.

use earshot_core::{
    Endpoint, EndpointId, Identity, LogEntry, Notice, Orchestrator, ProximityTransport, Role,
    TransportEvent,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{command::SessionCommand, error::SessionError, runtime::SessionRuntime};

const COMMAND_BUFFER: usize = 32;
const NOTICE_BUFFER: usize = 64;

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current role.
    pub role: Role,
    /// Candidates visible to a discoverer, in id order.
    pub discovered: Vec<Endpoint>,
    /// Endpoints with an established link, in id order.
    pub connected: Vec<Endpoint>,
    /// Transcript entries, newest first.
    pub messages: Vec<LogEntry>,
}

/// Handle to a running session.
///
/// Cheap to clone; all clones talk to the same runtime task. Dropping every
/// handle tears the session down as if it had gone offline.
#[derive(Debug, Clone)]
pub struct Session {
    commands: mpsc::Sender<SessionCommand>,
    notices: broadcast::Sender<Notice>,
}

impl Session {
    /// Go online: spawn the runtime task for this identity and transport.
    ///
    /// `events` carries the transport's callbacks; the transport object
    /// itself only receives commands. Must be called from within a tokio
    /// runtime.
    pub fn go_online<T: ProximityTransport>(
        identity: Identity,
        transport: T,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notices_tx, _) = broadcast::channel(NOTICE_BUFFER);
        let runtime = SessionRuntime::new(
            Orchestrator::new(identity),
            transport,
            commands_rx,
            events,
            notices_tx.clone(),
        );
        tokio::spawn(runtime.run());
        Self { commands: commands_tx, notices: notices_tx }
    }

    /// Subscribe to boundary notices (status changes, messages, toasts).
    ///
    /// A slow subscriber can lag and miss notices; poll
    /// [`Session::snapshot`] for authoritative state.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Send a chat message over every established link.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the runtime task is gone.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::SendMessage { text: text.into() })
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Request a connection to a specific discovered endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the runtime task is gone.
    pub async fn connect_to(&self, endpoint_id: EndpointId) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::ConnectTo { endpoint_id })
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Read a consistent copy of the session state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the runtime task is gone.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Go offline: stop advertising, discovery and every link, then wait for
    /// the runtime to acknowledge the teardown.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the runtime task was already
    /// gone.
    pub async fn go_offline(self) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Shutdown { ack: ack_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        ack_rx.await.map_err(|_| SessionError::Closed)
    }
}
