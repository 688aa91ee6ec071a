//! Connection orchestrator for proximity chat.
//!
//! This module implements the session core: role negotiation, endpoint
//! bookkeeping, connection establishment and failover, and the message path.
//!
//! # Architecture: Action-Based State Machine
//!
//! The orchestrator follows the action pattern:
//! - Methods consume UI commands or [`TransportEvent`]s
//! - Methods return `Vec<Action>` describing intended effects
//! - Driver code executes actions (transport calls, UI notices)
//!
//! This enables:
//! - Pure orchestration logic (no I/O)
//! - Easy testing (no mocking of a radio)
//! - Composability (the same machine runs in production and simulation)
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  go online   ┌─────────────┐  handshake   ┌───────────┐
//! │ Unknown │─────────────>│ Discovering │─────────────>│ Connected │
//! └─────────┘              │     or      │   success    └───────────┘
//!      ▲                   │ Advertising │                    │
//!      │                   └─────────────┘<───────────────────┘
//!      │                                    last link dropped
//!      └────────────── go offline (from any state)
//! ```
//!
//! # Lifecycle
//!
//! 1. **Unknown**: offline; initial and terminal state
//! 2. **Discovering** or **Advertising**: chosen by the identity's
//!    advertiser marker when going online
//! 3. **Connected**: at least one established link; an advertiser keeps
//!    advertising so further peers can still reach it
//! 4. Losing the last link falls back to the previous role; going offline
//!    returns to **Unknown** and clears everything
//!
//! # Failure handling
//!
//! Nothing here is fatal. Rejected transport calls surface as diagnostic
//! toasts, failed handshakes trigger an immediate retry against the first
//! remaining candidate in id order (no fairness guarantee, no backoff), and
//! events for ids no longer tracked are absorbed. No timeout governs an
//! in-flight connection request.

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    action::{Action, Notice},
    endpoint::{Endpoint, EndpointId},
    event::{RequestKind, TransportEvent},
    identity::Identity,
    log::MessageLog,
    role::Role,
    roster::Roster,
};

/// The session state machine.
///
/// One instance per session, created on "go online" and discarded after
/// [`Orchestrator::shutdown`]. All bookkeeping is mutated only inside this
/// type's handlers; callers observe through the read accessors and execute
/// the returned actions.
#[derive(Debug)]
pub struct Orchestrator {
    identity: Identity,
    role: Role,
    advertising: bool,
    discovering: bool,
    /// The single permitted in-flight connection request.
    connecting: Option<EndpointId>,
    roster: Roster,
    log: MessageLog,
}

impl Orchestrator {
    /// Create an offline orchestrator for this identity.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            role: Role::Unknown,
            advertising: false,
            discovering: false,
            connecting: None,
            roster: Roster::new(),
            log: MessageLog::new(),
        }
    }

    /// Current role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Local identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// True while a connection request is in flight.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.connecting.is_some()
    }

    /// Endpoint bookkeeping.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Session transcript, newest first.
    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    /// Go online: enter the role the identity's marker selects.
    pub fn start(&mut self) -> Vec<Action> {
        let role = self.identity.initial_role();
        info!(name = self.identity.display_name(), %role, "going online");
        self.transition(role)
    }

    /// Go offline: stop everything, clear all bookkeeping and the
    /// transcript.
    pub fn shutdown(&mut self) -> Vec<Action> {
        info!("going offline");
        let actions = self.transition(Role::Unknown);
        self.log.clear();
        actions
    }

    /// Process one transport callback.
    pub fn handle(&mut self, event: TransportEvent) -> Vec<Action> {
        match event {
            TransportEvent::EndpointFound { endpoint_id, display_name } => {
                self.on_endpoint_found(endpoint_id, display_name)
            },
            TransportEvent::EndpointLost { endpoint_id } => self.on_endpoint_lost(&endpoint_id),
            TransportEvent::ConnectionInitiated { endpoint_id, display_name } => {
                self.on_connection_initiated(endpoint_id, display_name)
            },
            TransportEvent::ConnectionResult { endpoint_id, success } => {
                self.on_connection_result(&endpoint_id, success)
            },
            TransportEvent::Disconnected { endpoint_id } => self.on_disconnected(&endpoint_id),
            TransportEvent::PayloadReceived { endpoint_id, payload } => {
                self.on_payload_received(&endpoint_id, &payload)
            },
            TransportEvent::RequestFailed { request, reason } => {
                self.on_request_failed(request, &reason)
            },
        }
    }

    /// Send a chat message over every established link.
    ///
    /// Fire-and-forget: the transcript records the message as soon as the
    /// send is issued, with no delivery confirmation. With no links up this
    /// is a no-op and the transcript is untouched.
    pub fn send_message(&mut self, text: &str) -> Vec<Action> {
        if !self.roster.has_connected() {
            debug!("send with no links, dropping");
            return Vec::new();
        }
        self.log.record_sent(text);
        vec![Action::SendPayload {
            endpoint_ids: self.roster.connected_ids(),
            payload: Bytes::copy_from_slice(text.as_bytes()),
        }]
    }

    /// Request a connection to a specific discovered endpoint.
    ///
    /// The manual counterpart of the eager candidate policy, for UI layers
    /// that list candidates. Applicable only while discovering, with the id
    /// currently discovered and no request in flight; otherwise absorbed.
    pub fn connect_to(&mut self, endpoint_id: &EndpointId) -> Vec<Action> {
        if self.role != Role::Discovering
            || self.connecting.is_some()
            || !self.roster.is_discovered(endpoint_id)
        {
            debug!(endpoint = %endpoint_id, "pick not applicable, ignoring");
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.request_connection(endpoint_id.clone(), &mut actions);
        actions
    }

    fn on_endpoint_found(&mut self, endpoint_id: EndpointId, display_name: String) -> Vec<Action> {
        if self.role != Role::Discovering {
            debug!(endpoint = %endpoint_id, role = %self.role, "found outside discovery, ignoring");
            return Vec::new();
        }
        if !self.identity.expects_peer(&display_name) {
            debug!(endpoint = %endpoint_id, name = %display_name, "unmarked endpoint, ignoring");
            return Vec::new();
        }
        let endpoint = Endpoint::new(endpoint_id, display_name);
        let endpoint_id = endpoint.id.clone();
        if !self.roster.register_found(endpoint) {
            debug!(endpoint = %endpoint_id, "already pending or connected, ignoring");
            return Vec::new();
        }
        // Eager policy: the first qualifying candidate is requested
        // immediately, unranked.
        let mut actions = Vec::new();
        if self.connecting.is_none() {
            self.request_connection(endpoint_id, &mut actions);
        }
        actions
    }

    fn on_endpoint_lost(&mut self, endpoint_id: &EndpointId) -> Vec<Action> {
        if self.roster.drop_discovered(endpoint_id).is_some() {
            debug!(endpoint = %endpoint_id, "candidate lost");
        }
        Vec::new()
    }

    fn on_connection_initiated(
        &mut self,
        endpoint_id: EndpointId,
        display_name: String,
    ) -> Vec<Action> {
        if self.role == Role::Unknown {
            debug!(endpoint = %endpoint_id, "handshake initiated while offline, ignoring");
            return Vec::new();
        }
        let endpoint = Endpoint::new(endpoint_id, display_name);
        let endpoint_id = endpoint.id.clone();
        if !self.roster.admit(endpoint) {
            debug!(endpoint = %endpoint_id, "handshake for connected endpoint, ignoring");
            return Vec::new();
        }
        // Auto-accept: trust is delegated to the transport's own pairing.
        vec![Action::AcceptConnection { endpoint_id }]
    }

    fn on_connection_result(&mut self, endpoint_id: &EndpointId, success: bool) -> Vec<Action> {
        if !self.roster.is_pending(endpoint_id) {
            debug!(endpoint = %endpoint_id, "result for unknown handshake, ignoring");
            return Vec::new();
        }
        if self.connecting.as_ref() == Some(endpoint_id) {
            self.connecting = None;
        }
        let mut actions = Vec::new();
        if success {
            if let Some(endpoint) = self.roster.establish(endpoint_id) {
                info!(endpoint = %endpoint.id, name = %endpoint.display_name, "link established");
            }
            actions.extend(self.transition(Role::Connected));
            actions.push(Action::Notify(Notice::ConnectionStatus { connected: true }));
            actions.push(Action::Notify(Notice::Toast {
                text: format!("connected to {endpoint_id}"),
            }));
        } else {
            warn!(endpoint = %endpoint_id, "handshake failed");
            self.roster.abandon(endpoint_id);
            actions.push(Action::Notify(Notice::ConnectionStatus {
                connected: self.roster.has_connected(),
            }));
            self.retry_next_candidate(&mut actions);
        }
        actions
    }

    fn on_disconnected(&mut self, endpoint_id: &EndpointId) -> Vec<Action> {
        let Some(endpoint) = self.roster.drop_connected(endpoint_id) else {
            debug!(endpoint = %endpoint_id, "disconnect for unknown endpoint, ignoring");
            return Vec::new();
        };
        info!(endpoint = %endpoint.id, "link dropped");
        let still_connected = self.roster.has_connected();
        let mut actions =
            vec![Action::Notify(Notice::ConnectionStatus { connected: still_connected })];
        if !still_connected && self.role == Role::Connected {
            // Advertisers never stopped advertising, so they fall back to
            // Advertising; discoverers restart the scan for a new peer.
            let fallback = if self.advertising { Role::Advertising } else { Role::Discovering };
            actions.extend(self.transition(fallback));
        }
        actions
    }

    fn on_payload_received(&mut self, endpoint_id: &EndpointId, payload: &Bytes) -> Vec<Action> {
        // Decode failure yields the empty string, never an error.
        let text = String::from_utf8(payload.to_vec()).unwrap_or_default();
        debug!(endpoint = %endpoint_id, bytes = payload.len(), "payload received");
        self.log.record_received(text.clone());
        vec![Action::Notify(Notice::Message { text })]
    }

    fn on_request_failed(&mut self, request: RequestKind, reason: &str) -> Vec<Action> {
        match request {
            RequestKind::Advertise => {
                warn!(reason, "advertising rejected");
                vec![Action::Notify(Notice::Toast { text: format!("advertising failed: {reason}") })]
            },
            RequestKind::Discover => {
                warn!(reason, "discovery rejected");
                vec![Action::Notify(Notice::Toast { text: format!("discovery failed: {reason}") })]
            },
            RequestKind::Connect(endpoint_id) => {
                warn!(endpoint = %endpoint_id, reason, "connection request rejected");
                if self.connecting.as_ref() == Some(&endpoint_id) {
                    self.connecting = None;
                }
                self.roster.abandon(&endpoint_id);
                let mut actions = vec![
                    Action::Disconnect { endpoint_id },
                    Action::Notify(Notice::Toast {
                        text: format!("connection request failed: {reason}"),
                    }),
                ];
                self.retry_next_candidate(&mut actions);
                actions
            },
        }
    }

    /// Move a discovered endpoint to pending and issue the request.
    fn request_connection(&mut self, endpoint_id: EndpointId, actions: &mut Vec<Action>) {
        if self.roster.begin_handshake(&endpoint_id).is_none() {
            debug!(endpoint = %endpoint_id, "request for unknown candidate, ignoring");
            return;
        }
        info!(endpoint = %endpoint_id, "requesting connection");
        self.connecting = Some(endpoint_id.clone());
        actions.push(Action::RequestConnection {
            display_name: self.identity.display_name().to_owned(),
            endpoint_id,
        });
    }

    /// Retry policy: first remaining candidate in id order, immediately, no
    /// backoff. Not fair; a repeatedly failing candidate starves the rest.
    fn retry_next_candidate(&mut self, actions: &mut Vec<Action>) {
        if self.role != Role::Discovering || self.connecting.is_some() {
            return;
        }
        let Some(candidate) = self.roster.first_discovered().map(|e| e.id.clone()) else {
            debug!("no candidates left to retry");
            return;
        };
        info!(endpoint = %candidate, "retrying with next candidate");
        self.request_connection(candidate, actions);
    }

    /// Disconnect every established link, reporting the status drop.
    fn disconnect_all(&mut self, actions: &mut Vec<Action>) {
        let dropped = self.roster.take_connected();
        if dropped.is_empty() {
            return;
        }
        for endpoint in dropped {
            actions.push(Action::Disconnect { endpoint_id: endpoint.id });
        }
        actions.push(Action::Notify(Notice::ConnectionStatus { connected: false }));
    }

    /// Role transition. No-op when the target equals the current role.
    fn transition(&mut self, target: Role) -> Vec<Action> {
        if target == self.role {
            debug!(role = %target, "already in role, no-op");
            return Vec::new();
        }
        info!(from = %self.role, to = %target, "role transition");
        let mut actions = Vec::new();
        match target {
            Role::Discovering => {
                if self.advertising {
                    actions.push(Action::StopAdvertising);
                    self.advertising = false;
                }
                self.disconnect_all(&mut actions);
                self.roster.clear_transient();
                self.connecting = None;
                if !self.discovering {
                    actions.push(Action::StartDiscovery);
                    self.discovering = true;
                }
            },
            Role::Advertising => {
                if self.discovering {
                    actions.push(Action::StopDiscovery);
                    self.discovering = false;
                }
                self.disconnect_all(&mut actions);
                self.roster.clear_transient();
                self.connecting = None;
                // An advertiser falling back from Connected never stopped
                // advertising; only start when actually inactive.
                if !self.advertising {
                    actions.push(Action::StartAdvertising {
                        display_name: self.identity.display_name().to_owned(),
                    });
                    self.advertising = true;
                }
            },
            Role::Connected => {
                if self.discovering {
                    actions.push(Action::StopDiscovery);
                    self.discovering = false;
                }
                // Advertising, if active, continues: further peers may
                // still reach an advertiser.
            },
            Role::Unknown => {
                // Shutdown issues every stop unconditionally so a later
                // session starts from a clean radio.
                actions.push(Action::StopAdvertising);
                actions.push(Action::StopDiscovery);
                actions.push(Action::StopAllEndpoints);
                self.advertising = false;
                self.discovering = false;
                self.connecting = None;
                if self.roster.has_connected() {
                    actions.push(Action::Notify(Notice::ConnectionStatus { connected: false }));
                }
                self.roster.clear_all();
            },
        }
        self.role = target;
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Direction;

    fn id(s: &str) -> EndpointId {
        EndpointId::from(s)
    }

    fn found(eid: &str, name: &str) -> TransportEvent {
        TransportEvent::EndpointFound { endpoint_id: id(eid), display_name: name.to_owned() }
    }

    fn initiated(eid: &str, name: &str) -> TransportEvent {
        TransportEvent::ConnectionInitiated { endpoint_id: id(eid), display_name: name.to_owned() }
    }

    fn result(eid: &str, success: bool) -> TransportEvent {
        TransportEvent::ConnectionResult { endpoint_id: id(eid), success }
    }

    fn discoverer() -> Orchestrator {
        let mut orch = Orchestrator::new(Identity::new("Alice"));
        let actions = orch.start();
        assert_eq!(actions, vec![Action::StartDiscovery]);
        orch
    }

    fn advertiser() -> Orchestrator {
        let mut orch = Orchestrator::new(Identity::new("1-Bob"));
        let actions = orch.start();
        assert_eq!(actions, vec![Action::StartAdvertising { display_name: "1-Bob".to_owned() }]);
        orch
    }

    fn request_actions(actions: &[Action]) -> Vec<&EndpointId> {
        actions
            .iter()
            .filter_map(|action| match action {
                Action::RequestConnection { endpoint_id, .. } => Some(endpoint_id),
                _ => None,
            })
            .collect()
    }

    fn assert_disjoint(orch: &Orchestrator) {
        let mut seen = std::collections::BTreeSet::new();
        let roster = orch.roster();
        for endpoint in roster.discovered().chain(roster.pending()).chain(roster.connected()) {
            assert!(seen.insert(endpoint.id.clone()), "id {} in two sets", endpoint.id);
        }
    }

    #[test]
    fn discoverer_requests_first_qualifying_candidate() {
        let mut orch = discoverer();

        let actions = orch.handle(found("e1", "1-Bob"));
        assert_eq!(request_actions(&actions).len(), 1);
        assert_eq!(request_actions(&actions)[0], &id("e1"));
        assert!(orch.is_connecting());
        assert!(orch.roster().is_pending(&id("e1")));
        assert_disjoint(&orch);
    }

    #[test]
    fn handshake_success_connects_and_stops_discovery() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        let accept = orch.handle(initiated("e1", "1-Bob"));
        assert_eq!(accept, vec![Action::AcceptConnection { endpoint_id: id("e1") }]);

        let actions = orch.handle(result("e1", true));
        assert!(actions.contains(&Action::StopDiscovery));
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: true })));
        assert_eq!(orch.role(), Role::Connected);
        assert!(orch.roster().is_connected(&id("e1")));
        assert!(!orch.is_connecting());
        assert_disjoint(&orch);
    }

    #[test]
    fn handshake_failure_retries_next_candidate() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));

        // Second candidate is registered but not requested while e1 is in
        // flight.
        let actions = orch.handle(found("e2", "1-Carol"));
        assert!(request_actions(&actions).is_empty());
        assert!(orch.roster().is_discovered(&id("e2")));

        let actions = orch.handle(result("e1", false));
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: false })));
        assert_eq!(request_actions(&actions), vec![&id("e2")]);
        assert!(orch.is_connecting());
        assert!(orch.roster().is_pending(&id("e2")));
        assert!(!orch.roster().is_pending(&id("e1")));
        assert_disjoint(&orch);
    }

    #[test]
    fn disconnect_falls_back_to_discovery() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(result("e1", true));
        assert_eq!(orch.role(), Role::Connected);

        let actions = orch.handle(TransportEvent::Disconnected { endpoint_id: id("e1") });
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: false })));
        assert!(actions.contains(&Action::StartDiscovery));
        assert_eq!(orch.role(), Role::Discovering);
        assert!(!orch.roster().has_connected());
    }

    #[test]
    fn send_message_with_no_links_is_dropped() {
        let mut orch = discoverer();
        let actions = orch.send_message("hi");
        assert!(actions.is_empty());
        assert!(orch.messages().is_empty());
    }

    #[test]
    fn shutdown_stops_everything_from_any_state() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(result("e1", true));
        orch.send_message("hi");

        let actions = orch.shutdown();
        assert!(actions.contains(&Action::StopAdvertising));
        assert!(actions.contains(&Action::StopDiscovery));
        assert!(actions.contains(&Action::StopAllEndpoints));
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: false })));
        assert_eq!(orch.role(), Role::Unknown);
        assert!(!orch.roster().has_connected());
        assert_eq!(orch.roster().discovered().count(), 0);
        assert_eq!(orch.roster().pending().count(), 0);
        assert!(orch.messages().is_empty());
    }

    #[test]
    fn repeated_transition_is_noop() {
        let mut orch = discoverer();
        let actions = orch.transition(Role::Discovering);
        assert!(actions.is_empty());
        assert_eq!(orch.role(), Role::Discovering);
    }

    #[test]
    fn unmarked_endpoints_are_ignored() {
        let mut orch = discoverer();
        let actions = orch.handle(found("e1", "Carol"));
        assert!(actions.is_empty());
        assert!(!orch.roster().is_discovered(&id("e1")));
        assert!(!orch.is_connecting());
    }

    #[test]
    fn found_outside_discovery_is_ignored() {
        let mut orch = advertiser();
        let actions = orch.handle(found("e1", "1-Other"));
        assert!(actions.is_empty());
        assert!(!orch.roster().is_discovered(&id("e1")));
    }

    #[test]
    fn advertiser_accepts_initiated_handshake() {
        let mut orch = advertiser();
        let actions = orch.handle(initiated("e1", "Alice"));
        assert_eq!(actions, vec![Action::AcceptConnection { endpoint_id: id("e1") }]);

        let actions = orch.handle(result("e1", true));
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: true })));
        assert!(!actions.contains(&Action::StopAdvertising));
        assert_eq!(orch.role(), Role::Connected);
    }

    #[test]
    fn advertiser_keeps_advertising_across_links() {
        let mut orch = advertiser();
        orch.handle(initiated("e1", "Alice"));
        orch.handle(result("e1", true));
        orch.handle(initiated("e2", "Carol"));
        orch.handle(result("e2", true));
        assert_eq!(orch.roster().connected_ids(), vec![id("e1"), id("e2")]);

        // First link drops: still connected overall.
        let actions = orch.handle(TransportEvent::Disconnected { endpoint_id: id("e1") });
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: true })));
        assert_eq!(orch.role(), Role::Connected);

        // Last link drops: fall back to Advertising without restarting the
        // broadcast.
        let actions = orch.handle(TransportEvent::Disconnected { endpoint_id: id("e2") });
        assert!(actions.contains(&Action::Notify(Notice::ConnectionStatus { connected: false })));
        assert!(!actions.iter().any(|a| matches!(a, Action::StartAdvertising { .. })));
        assert_eq!(orch.role(), Role::Advertising);
    }

    #[test]
    fn send_message_fans_out_to_all_links() {
        let mut orch = advertiser();
        orch.handle(initiated("e1", "Alice"));
        orch.handle(result("e1", true));
        orch.handle(initiated("e2", "Carol"));
        orch.handle(result("e2", true));

        let actions = orch.send_message("hi all");
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::SendPayload { endpoint_ids, payload } => {
                assert_eq!(endpoint_ids, &vec![id("e1"), id("e2")]);
                assert_eq!(payload.as_ref(), b"hi all");
            },
            other => panic!("expected SendPayload, got {other:?}"),
        }
        let latest = orch.messages().latest().unwrap();
        assert_eq!(latest.direction, Direction::Sent);
        assert_eq!(latest.text, "hi all");
    }

    #[test]
    fn payload_decode_failure_yields_empty_message() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(result("e1", true));

        let actions = orch.handle(TransportEvent::PayloadReceived {
            endpoint_id: id("e1"),
            payload: Bytes::from_static(&[0xff, 0xfe, 0xfd]),
        });
        assert_eq!(actions, vec![Action::Notify(Notice::Message { text: String::new() })]);
        let latest = orch.messages().latest().unwrap();
        assert_eq!(latest.direction, Direction::Received);
        assert_eq!(latest.text, "");
    }

    #[test]
    fn received_messages_are_prepended() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(result("e1", true));

        for text in ["one", "two"] {
            orch.handle(TransportEvent::PayloadReceived {
                endpoint_id: id("e1"),
                payload: Bytes::copy_from_slice(text.as_bytes()),
            });
        }
        let texts: Vec<&str> = orch.messages().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["two", "one"]);
    }

    #[test]
    fn connect_request_rejection_cleans_up_and_retries() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(found("e2", "1-Carol"));

        let actions = orch.handle(TransportEvent::RequestFailed {
            request: RequestKind::Connect(id("e1")),
            reason: "radio busy".to_owned(),
        });
        assert!(actions.contains(&Action::Disconnect { endpoint_id: id("e1") }));
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Notify(Notice::Toast { text }) if text.contains("radio busy")
        )));
        assert_eq!(request_actions(&actions), vec![&id("e2")]);
        assert!(!orch.roster().is_pending(&id("e1")));
        assert_disjoint(&orch);
    }

    #[test]
    fn advertise_rejection_surfaces_toast_only() {
        let mut orch = advertiser();
        let actions = orch.handle(TransportEvent::RequestFailed {
            request: RequestKind::Advertise,
            reason: "permission denied".to_owned(),
        });
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            Action::Notify(Notice::Toast { text }) if text.contains("permission denied")
        ));
        assert_eq!(orch.role(), Role::Advertising);
    }

    #[test]
    fn stale_connection_result_is_absorbed() {
        let mut orch = discoverer();
        let actions = orch.handle(result("ghost", true));
        assert!(actions.is_empty());
        assert_eq!(orch.role(), Role::Discovering);
        assert!(!orch.roster().is_connected(&id("ghost")));
    }

    #[test]
    fn offline_events_are_absorbed() {
        let mut orch = Orchestrator::new(Identity::new("Alice"));
        assert!(orch.handle(found("e1", "1-Bob")).is_empty());
        assert!(orch.handle(initiated("e1", "1-Bob")).is_empty());
        assert!(orch.handle(result("e1", true)).is_empty());
        assert_eq!(orch.role(), Role::Unknown);
    }

    #[test]
    fn endpoint_lost_removes_candidate_without_actions() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(found("e2", "1-Carol"));

        let actions = orch.handle(TransportEvent::EndpointLost { endpoint_id: id("e2") });
        assert!(actions.is_empty());
        assert!(!orch.roster().is_discovered(&id("e2")));

        // With the only remaining candidate gone, a failure has nothing to
        // retry against.
        let actions = orch.handle(result("e1", false));
        assert!(request_actions(&actions).is_empty());
        assert!(!orch.is_connecting());
    }

    #[test]
    fn initiated_refreshes_pending_name() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));

        orch.handle(initiated("e1", "1-Bobby"));
        let names: Vec<&str> =
            orch.roster().pending().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["1-Bobby"]);
        assert_disjoint(&orch);
    }

    #[test]
    fn connect_to_requests_specific_candidate() {
        let mut orch = discoverer();
        // Candidate registered without an automatic request in flight.
        orch.roster.register_found(Endpoint::new("e2", "1-Carol"));

        let actions = orch.connect_to(&id("e2"));
        assert_eq!(request_actions(&actions), vec![&id("e2")]);
        assert!(orch.is_connecting());
        assert!(orch.roster().is_pending(&id("e2")));
    }

    #[test]
    fn connect_to_ignored_while_request_in_flight() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(found("e2", "1-Carol"));

        let actions = orch.connect_to(&id("e2"));
        assert!(actions.is_empty());
        assert!(orch.roster().is_discovered(&id("e2")));
        assert!(orch.roster().is_pending(&id("e1")));
    }

    #[test]
    fn connect_to_ignored_for_unknown_candidate() {
        let mut orch = discoverer();
        let actions = orch.connect_to(&id("ghost"));
        assert!(actions.is_empty());
        assert!(!orch.is_connecting());
    }

    #[test]
    fn second_find_while_connected_is_ignored() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(result("e1", true));

        let actions = orch.handle(found("e2", "1-Carol"));
        assert!(actions.is_empty());
        assert!(!orch.roster().is_discovered(&id("e2")));
    }

    #[test]
    fn duplicate_find_refreshes_candidate_name() {
        let mut orch = discoverer();
        orch.handle(found("e1", "1-Bob"));
        orch.handle(found("e2", "1-Carol"));

        let actions = orch.handle(found("e2", "1-Caroline"));
        assert!(actions.is_empty());
        let names: Vec<&str> =
            orch.roster().discovered().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["1-Caroline"]);
    }
}
