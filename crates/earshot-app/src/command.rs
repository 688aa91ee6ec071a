//! Commands from the session handle to the runtime task.

use earshot_core::EndpointId;
use tokio::sync::oneshot;

use crate::session::SessionSnapshot;

/// One request from a [`crate::Session`] handle.
#[derive(Debug)]
pub enum SessionCommand {
    /// Send a chat message over every established link.
    SendMessage {
        /// Plain-text message body.
        text: String,
    },
    /// Request a connection to a specific discovered endpoint.
    ConnectTo {
        /// Candidate to connect to.
        endpoint_id: EndpointId,
    },
    /// Read a consistent copy of the session state.
    Snapshot {
        /// Where the copy is delivered.
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Tear the session down; acknowledged once the radio is quiet.
    Shutdown {
        /// Fired after every stop has been issued.
        ack: oneshot::Sender<()>,
    },
}
