//! The session task: feeds the orchestrator and executes its actions.
//!
//! Commands from the handle and callbacks from the transport are multiplexed
//! into the single-threaded orchestrator. Actions run against the transport
//! in order; a rejected advertise, discovery or connection request is fed
//! straight back into the orchestrator as a [`TransportEvent::RequestFailed`],
//! so the retry policy sees synchronous failures the same way it sees
//! asynchronous ones.

use std::collections::VecDeque;

use earshot_core::{Action, Notice, Orchestrator, ProximityTransport, RequestKind, TransportEvent};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::{command::SessionCommand, session::SessionSnapshot};

pub struct SessionRuntime<T> {
    orchestrator: Orchestrator,
    transport: T,
    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Receiver<TransportEvent>,
    notices: broadcast::Sender<Notice>,
}

impl<T: ProximityTransport> SessionRuntime<T> {
    pub fn new(
        orchestrator: Orchestrator,
        transport: T,
        commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Receiver<TransportEvent>,
        notices: broadcast::Sender<Notice>,
    ) -> Self {
        Self { orchestrator, transport, commands, events, notices }
    }

    /// Run until an explicit shutdown or until both channels close.
    pub async fn run(mut self) {
        let startup = self.orchestrator.start();
        self.execute(startup).await;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await {
                            return;
                        }
                    },
                    None => break,
                },
                event = self.events.recv() => match event {
                    Some(event) => {
                        let actions = self.orchestrator.handle(event);
                        self.execute(actions).await;
                    },
                    None => break,
                },
            }
        }

        // Handle dropped or transport gone: still quiesce the radio.
        debug!("channel closed without explicit shutdown, quiescing");
        let actions = self.orchestrator.shutdown();
        self.execute(actions).await;
    }

    /// Returns `true` when the command was a shutdown and the loop must end.
    async fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SendMessage { text } => {
                let actions = self.orchestrator.send_message(&text);
                self.execute(actions).await;
                false
            },
            SessionCommand::ConnectTo { endpoint_id } => {
                let actions = self.orchestrator.connect_to(&endpoint_id);
                self.execute(actions).await;
                false
            },
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                false
            },
            SessionCommand::Shutdown { ack } => {
                let actions = self.orchestrator.shutdown();
                self.execute(actions).await;
                let _ = ack.send(());
                true
            },
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            role: self.orchestrator.role(),
            discovered: self.orchestrator.roster().discovered().cloned().collect(),
            connected: self.orchestrator.roster().connected().cloned().collect(),
            messages: self.orchestrator.messages().iter().cloned().collect(),
        }
    }

    /// Drain an action batch, folding failure feedback back into the
    /// orchestrator until the worklist is empty.
    async fn execute(&mut self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            if let Some(feedback) = self.perform(action).await {
                queue.extend(self.orchestrator.handle(feedback));
            }
        }
    }

    async fn perform(&mut self, action: Action) -> Option<TransportEvent> {
        match action {
            Action::StartAdvertising { display_name } => self
                .transport
                .start_advertising(&display_name)
                .await
                .err()
                .map(|error| TransportEvent::RequestFailed {
                    request: RequestKind::Advertise,
                    reason: error.reason().to_owned(),
                }),
            Action::StopAdvertising => {
                self.transport.stop_advertising().await;
                None
            },
            Action::StartDiscovery => {
                self.transport.start_discovery().await.err().map(|error| {
                    TransportEvent::RequestFailed {
                        request: RequestKind::Discover,
                        reason: error.reason().to_owned(),
                    }
                })
            },
            Action::StopDiscovery => {
                self.transport.stop_discovery().await;
                None
            },
            Action::RequestConnection { display_name, endpoint_id } => self
                .transport
                .request_connection(&display_name, &endpoint_id)
                .await
                .err()
                .map(|error| TransportEvent::RequestFailed {
                    request: RequestKind::Connect(endpoint_id),
                    reason: error.reason().to_owned(),
                }),
            Action::AcceptConnection { endpoint_id } => {
                if let Err(error) = self.transport.accept_connection(&endpoint_id).await {
                    warn!(endpoint = %endpoint_id, %error, "accept rejected by transport");
                    self.notify(Notice::Toast {
                        text: format!("accept failed: {}", error.reason()),
                    });
                }
                None
            },
            Action::SendPayload { endpoint_ids, payload } => {
                if let Err(error) = self.transport.send_payload(&endpoint_ids, payload).await {
                    warn!(%error, "send rejected by transport");
                }
                None
            },
            Action::Disconnect { endpoint_id } => {
                self.transport.disconnect(&endpoint_id).await;
                None
            },
            Action::StopAllEndpoints => {
                self.transport.stop_all_endpoints().await;
                None
            },
            Action::Notify(notice) => {
                self.notify(notice);
                None
            },
        }
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            debug!("no notice subscribers");
        }
    }
}
