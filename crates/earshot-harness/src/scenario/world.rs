//! World state for scenario execution.
//!
//! The world plays the radio. It owns one orchestrator per actor, executes
//! every action an orchestrator emits, and converts transport commands into
//! the [`TransportEvent`]s the other side would observe. Events queue in FIFO
//! order and are delivered one per [`World::step`], so runs are deterministic
//! and every intermediate state can be inspected.
//!
//! Visibility follows the radio model: an actor is found only while it
//! advertises and the observer scans, handshakes complete once both sides
//! accept, and payloads travel only over established links.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use bytes::Bytes;
use earshot_core::{
    Action, EndpointId, Identity, Notice, Orchestrator, RequestKind, Role, TransportEvent,
    identity::ADVERTISER_TAG,
};
use tracing::warn;

use crate::faults::FaultPlan;

/// Delivery cap for one [`World::run_until_idle`] call. A schedule that does
/// not quiesce by then (for example a 100% handshake failure rate feeding the
/// retry loop) is cut off with a warning.
const MAX_STEPS: usize = 10_000;

struct Actor {
    orchestrator: Orchestrator,
    endpoint_id: EndpointId,
    advertising: bool,
    discovering: bool,
    notices: Vec<Notice>,
    issued: Vec<Action>,
    payloads_sent: usize,
    payloads_received: usize,
}

/// All actors plus the radio state between them.
#[derive(Default)]
pub struct World {
    actors: BTreeMap<String, Actor>,
    address_book: BTreeMap<EndpointId, String>,
    events: VecDeque<(String, TransportEvent)>,
    links: BTreeSet<(String, String)>,
    pending_accepts: BTreeSet<(String, String)>,
    next_endpoint: u32,
    faults: FaultPlan,
}

impl World {
    /// Create an empty world with no faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fault plan.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Add an offline actor whose display name carries the advertiser marker.
    pub fn add_advertiser(&mut self, name: impl Into<String>) {
        let name = name.into();
        let display_name = format!("{ADVERTISER_TAG}{name}");
        self.add_actor(name, display_name);
    }

    /// Add an offline actor with an unmarked display name.
    pub fn add_discoverer(&mut self, name: impl Into<String>) {
        let name = name.into();
        let display_name = name.clone();
        self.add_actor(name, display_name);
    }

    fn add_actor(&mut self, name: String, display_name: String) {
        let endpoint_id = EndpointId::new(format!("sim-{}", self.next_endpoint));
        self.next_endpoint += 1;
        self.address_book.insert(endpoint_id.clone(), name.clone());
        self.actors.insert(
            name,
            Actor {
                orchestrator: Orchestrator::new(Identity::new(display_name)),
                endpoint_id,
                advertising: false,
                discovering: false,
                notices: Vec::new(),
                issued: Vec::new(),
                payloads_sent: 0,
                payloads_received: 0,
            },
        );
    }

    /// Start an actor's session.
    pub fn go_online(&mut self, name: &str) {
        let Some(actor) = self.actors.get_mut(name) else {
            warn!(name, "go_online for unknown actor");
            return;
        };
        let actions = actor.orchestrator.start();
        self.process_actions(name, actions);
    }

    /// End an actor's session.
    pub fn go_offline(&mut self, name: &str) {
        let Some(actor) = self.actors.get_mut(name) else {
            warn!(name, "go_offline for unknown actor");
            return;
        };
        let actions = actor.orchestrator.shutdown();
        self.process_actions(name, actions);
    }

    /// Have an actor send a chat message.
    pub fn send_message(&mut self, name: &str, text: &str) {
        let Some(actor) = self.actors.get_mut(name) else {
            warn!(name, "send_message for unknown actor");
            return;
        };
        let actions = actor.orchestrator.send_message(text);
        self.process_actions(name, actions);
    }

    /// Have an actor request a connection to a specific candidate.
    pub fn connect_to(&mut self, name: &str, endpoint_id: &EndpointId) {
        let Some(actor) = self.actors.get_mut(name) else {
            warn!(name, "connect_to for unknown actor");
            return;
        };
        let actions = actor.orchestrator.connect_to(endpoint_id);
        self.process_actions(name, actions);
    }

    /// Drop an established link from the radio side, as if the peers moved
    /// out of range. Both ends observe a disconnect.
    pub fn sever_link(&mut self, a: &str, b: &str) {
        if !self.links.remove(&link_key(a, b)) {
            return;
        }
        if let (Some(a_id), Some(b_id)) = (self.endpoint_of(a), self.endpoint_of(b)) {
            self.push_event(a, TransportEvent::Disconnected { endpoint_id: b_id });
            self.push_event(b, TransportEvent::Disconnected { endpoint_id: a_id });
        }
    }

    /// Deliver the oldest queued event. Returns false when the queue is
    /// empty.
    pub fn step(&mut self) -> bool {
        let Some((name, event)) = self.events.pop_front() else {
            return false;
        };
        if matches!(event, TransportEvent::PayloadReceived { .. }) {
            if let Some(actor) = self.actors.get_mut(&name) {
                actor.payloads_received += 1;
            }
        }
        let Some(actor) = self.actors.get_mut(&name) else {
            return true;
        };
        let actions = actor.orchestrator.handle(event);
        self.process_actions(&name, actions);
        true
    }

    /// Deliver events until the queue drains, returning the number of
    /// deliveries.
    pub fn run_until_idle(&mut self) -> usize {
        let mut steps = 0;
        while self.step() {
            steps += 1;
            if steps >= MAX_STEPS {
                warn!(steps, "world did not quiesce, stopping delivery");
                break;
            }
        }
        steps
    }

    /// True when no events are waiting for delivery.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.events.is_empty()
    }

    fn process_actions(&mut self, name: &str, actions: Vec<Action>) {
        for action in actions {
            if let Some(actor) = self.actors.get_mut(name) {
                actor.issued.push(action.clone());
            }
            self.process_action(name, action);
        }
    }

    fn process_action(&mut self, name: &str, action: Action) {
        match action {
            Action::StartAdvertising { display_name } => {
                self.radio_start_advertising(name, &display_name);
            },
            Action::StopAdvertising => self.radio_stop_advertising(name),
            Action::StartDiscovery => self.radio_start_discovery(name),
            Action::StopDiscovery => self.radio_stop_discovery(name),
            Action::RequestConnection { display_name, endpoint_id } => {
                self.radio_request_connection(name, display_name, endpoint_id);
            },
            Action::AcceptConnection { endpoint_id } => {
                self.radio_accept_connection(name, &endpoint_id);
            },
            Action::SendPayload { endpoint_ids, payload } => {
                self.radio_send_payload(name, &endpoint_ids, &payload);
            },
            Action::Disconnect { endpoint_id } => self.radio_disconnect(name, &endpoint_id),
            Action::StopAllEndpoints => self.radio_stop_all(name),
            Action::Notify(notice) => {
                if let Some(actor) = self.actors.get_mut(name) {
                    actor.notices.push(notice);
                }
            },
        }
    }

    fn radio_start_advertising(&mut self, name: &str, display_name: &str) {
        if let Some(reason) = self.faults.take_advertise_rejection() {
            self.push_event(
                name,
                TransportEvent::RequestFailed { request: RequestKind::Advertise, reason },
            );
            return;
        }
        let Some(endpoint_id) = self.endpoint_of(name) else { return };
        if let Some(actor) = self.actors.get_mut(name) {
            actor.advertising = true;
        }
        for watcher in self.scanning_others(name) {
            self.push_event(
                &watcher,
                TransportEvent::EndpointFound {
                    endpoint_id: endpoint_id.clone(),
                    display_name: display_name.to_owned(),
                },
            );
        }
    }

    fn radio_stop_advertising(&mut self, name: &str) {
        let was_advertising = match self.actors.get_mut(name) {
            Some(actor) if actor.advertising => {
                actor.advertising = false;
                true
            },
            _ => false,
        };
        if !was_advertising {
            return;
        }
        let Some(endpoint_id) = self.endpoint_of(name) else { return };
        for watcher in self.scanning_others(name) {
            self.push_event(
                &watcher,
                TransportEvent::EndpointLost { endpoint_id: endpoint_id.clone() },
            );
        }
    }

    fn radio_start_discovery(&mut self, name: &str) {
        if let Some(reason) = self.faults.take_discovery_rejection() {
            self.push_event(
                name,
                TransportEvent::RequestFailed { request: RequestKind::Discover, reason },
            );
            return;
        }
        if let Some(actor) = self.actors.get_mut(name) {
            actor.discovering = true;
        }
        let visible: Vec<(EndpointId, String)> = self
            .actors
            .iter()
            .filter(|(other, actor)| other.as_str() != name && actor.advertising)
            .map(|(_, actor)| {
                (
                    actor.endpoint_id.clone(),
                    actor.orchestrator.identity().display_name().to_owned(),
                )
            })
            .collect();
        for (endpoint_id, display_name) in visible {
            self.push_event(name, TransportEvent::EndpointFound { endpoint_id, display_name });
        }
    }

    fn radio_stop_discovery(&mut self, name: &str) {
        if let Some(actor) = self.actors.get_mut(name) {
            actor.discovering = false;
        }
    }

    fn radio_request_connection(
        &mut self,
        name: &str,
        display_name: String,
        endpoint_id: EndpointId,
    ) {
        if let Some(reason) = self.faults.take_connect_rejection() {
            self.push_event(
                name,
                TransportEvent::RequestFailed {
                    request: RequestKind::Connect(endpoint_id),
                    reason,
                },
            );
            return;
        }
        let Some(target) = self.address_book.get(&endpoint_id).cloned() else {
            self.push_event(
                name,
                TransportEvent::RequestFailed {
                    request: RequestKind::Connect(endpoint_id),
                    reason: "unknown endpoint".to_owned(),
                },
            );
            return;
        };
        let target_display = match self.actors.get(&target) {
            Some(actor) if actor.orchestrator.role() != Role::Unknown => {
                actor.orchestrator.identity().display_name().to_owned()
            },
            _ => {
                self.push_event(
                    name,
                    TransportEvent::RequestFailed {
                        request: RequestKind::Connect(endpoint_id),
                        reason: "endpoint unreachable".to_owned(),
                    },
                );
                return;
            },
        };
        let Some(requester_id) = self.endpoint_of(name) else { return };
        // Both sides observe the initiated handshake, each under the other's
        // name.
        self.push_event(
            name,
            TransportEvent::ConnectionInitiated { endpoint_id, display_name: target_display },
        );
        self.push_event(
            &target,
            TransportEvent::ConnectionInitiated { endpoint_id: requester_id, display_name },
        );
    }

    fn radio_accept_connection(&mut self, name: &str, endpoint_id: &EndpointId) {
        if let Some(reason) = self.faults.take_accept_rejection() {
            // A dropped accept leaves the handshake unresolved. No timeout
            // exists, so the other side waits until its peer disappears.
            warn!(name, %reason, "accept rejected by radio");
            return;
        }
        let Some(peer) = self.address_book.get(endpoint_id).cloned() else { return };
        self.pending_accepts.insert((name.to_owned(), peer.clone()));
        if !self.pending_accepts.contains(&(peer.clone(), name.to_owned())) {
            return;
        }
        self.pending_accepts.remove(&(name.to_owned(), peer.clone()));
        self.pending_accepts.remove(&(peer.clone(), name.to_owned()));
        let success = !self.faults.handshake_should_fail();
        if success {
            self.links.insert(link_key(name, &peer));
        }
        let Some(my_id) = self.endpoint_of(name) else { return };
        self.push_event(
            name,
            TransportEvent::ConnectionResult { endpoint_id: endpoint_id.clone(), success },
        );
        self.push_event(&peer, TransportEvent::ConnectionResult { endpoint_id: my_id, success });
    }

    fn radio_send_payload(&mut self, name: &str, endpoint_ids: &[EndpointId], payload: &Bytes) {
        let Some(my_id) = self.endpoint_of(name) else { return };
        for endpoint_id in endpoint_ids {
            let Some(peer) = self.address_book.get(endpoint_id).cloned() else { continue };
            if !self.links.contains(&link_key(name, &peer)) {
                continue;
            }
            if let Some(actor) = self.actors.get_mut(name) {
                actor.payloads_sent += 1;
            }
            self.push_event(
                &peer,
                TransportEvent::PayloadReceived {
                    endpoint_id: my_id.clone(),
                    payload: payload.clone(),
                },
            );
        }
    }

    fn radio_disconnect(&mut self, name: &str, endpoint_id: &EndpointId) {
        let Some(peer) = self.address_book.get(endpoint_id).cloned() else { return };
        if !self.links.remove(&link_key(name, &peer)) {
            return;
        }
        let Some(my_id) = self.endpoint_of(name) else { return };
        self.push_event(&peer, TransportEvent::Disconnected { endpoint_id: my_id });
    }

    fn radio_stop_all(&mut self, name: &str) {
        let peers: Vec<String> = self
            .links
            .iter()
            .filter_map(|(a, b)| {
                if a == name {
                    Some(b.clone())
                } else if b == name {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect();
        self.links.retain(|(a, b)| a != name && b != name);
        self.pending_accepts.retain(|(a, b)| a != name && b != name);
        let Some(my_id) = self.endpoint_of(name) else { return };
        for peer in peers {
            self.push_event(&peer, TransportEvent::Disconnected { endpoint_id: my_id.clone() });
        }
    }

    fn push_event(&mut self, name: &str, event: TransportEvent) {
        self.events.push_back((name.to_owned(), event));
    }

    fn endpoint_of(&self, name: &str) -> Option<EndpointId> {
        self.actors.get(name).map(|actor| actor.endpoint_id.clone())
    }

    fn scanning_others(&self, name: &str) -> Vec<String> {
        self.actors
            .iter()
            .filter(|(other, actor)| other.as_str() != name && actor.discovering)
            .map(|(other, _)| other.clone())
            .collect()
    }

    /// An actor's orchestrator, for state inspection.
    #[must_use]
    pub fn orchestrator(&self, name: &str) -> Option<&Orchestrator> {
        self.actors.get(name).map(|actor| &actor.orchestrator)
    }

    /// An actor's current role.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<Role> {
        self.actors.get(name).map(|actor| actor.orchestrator.role())
    }

    /// The radio identifier assigned to an actor.
    #[must_use]
    pub fn endpoint_id(&self, name: &str) -> Option<&EndpointId> {
        self.actors.get(name).map(|actor| &actor.endpoint_id)
    }

    /// Every boundary notice an actor's orchestrator has emitted, in order.
    #[must_use]
    pub fn notices(&self, name: &str) -> &[Notice] {
        match self.actors.get(name) {
            Some(actor) => &actor.notices,
            None => &[],
        }
    }

    /// Every action an actor's orchestrator has emitted, in order.
    #[must_use]
    pub fn issued(&self, name: &str) -> &[Action] {
        match self.actors.get(name) {
            Some(actor) => &actor.issued,
            None => &[],
        }
    }

    /// True while a link between the two actors is established.
    #[must_use]
    pub fn linked(&self, a: &str, b: &str) -> bool {
        self.links.contains(&link_key(a, b))
    }

    /// Number of established links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Payload deliveries the radio performed on behalf of this sender.
    #[must_use]
    pub fn payloads_sent(&self, name: &str) -> usize {
        self.actors.get(name).map_or(0, |actor| actor.payloads_sent)
    }

    /// Payloads the radio delivered to this actor.
    #[must_use]
    pub fn payloads_received(&self, name: &str) -> usize {
        self.actors.get(name).map_or(0, |actor| actor.payloads_received)
    }

    /// All actor names, sorted.
    #[must_use]
    pub fn actor_names(&self) -> Vec<String> {
        self.actors.keys().cloned().collect()
    }

    /// True when every actor reached the connected role.
    #[must_use]
    pub fn all_connected(&self) -> bool {
        !self.actors.is_empty()
            && self.actors.values().all(|actor| actor.orchestrator.role() == Role::Connected)
    }

    /// Connection status notices an actor received, in order.
    #[must_use]
    pub fn status_reports(&self, name: &str) -> Vec<bool> {
        self.notices(name)
            .iter()
            .filter_map(|notice| match notice {
                Notice::ConnectionStatus { connected } => Some(*connected),
                _ => None,
            })
            .collect()
    }

    /// Toast texts an actor received, in order.
    #[must_use]
    pub fn toasts(&self, name: &str) -> Vec<String> {
        self.notices(name)
            .iter()
            .filter_map(|notice| match notice {
                Notice::Toast { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Chat texts an actor received, in order.
    #[must_use]
    pub fn received_texts(&self, name: &str) -> Vec<String> {
        self.notices(name)
            .iter()
            .filter_map(|notice| match notice {
                Notice::Message { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Normalized link key, smaller name first, so a link is one entry no matter
/// which side acted.
fn link_key(a: &str, b: &str) -> (String, String) {
    if a <= b { (a.to_owned(), b.to_owned()) } else { (b.to_owned(), a.to_owned()) }
}
