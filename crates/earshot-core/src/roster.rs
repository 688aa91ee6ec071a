//! Endpoint bookkeeping.
//!
//! Tracks remote endpoints through their lifecycle: discovered (visible while
//! scanning), pending (handshake in flight), connected (link established).
//! An endpoint id lives in at most one set at a time; every movement between
//! sets is a single operation on this type, so the disjointness invariant
//! cannot be violated from outside.
//!
//! Sets are ordered maps keyed by endpoint id, so iteration order (and with
//! it candidate selection) is deterministic.

use std::collections::BTreeMap;

use crate::endpoint::{Endpoint, EndpointId};

/// The three disjoint endpoint sets.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    discovered: BTreeMap<EndpointId, Endpoint>,
    pending: BTreeMap<EndpointId, Endpoint>,
    connected: BTreeMap<EndpointId, Endpoint>,
}

impl Roster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a discovery hit.
    ///
    /// Inserts (or refreshes) a discovered entry. Returns `false` without
    /// changing anything when the id already has a handshake in flight or an
    /// established link.
    pub fn register_found(&mut self, endpoint: Endpoint) -> bool {
        if self.pending.contains_key(&endpoint.id) || self.connected.contains_key(&endpoint.id) {
            return false;
        }
        self.discovered.insert(endpoint.id.clone(), endpoint);
        true
    }

    /// Move an endpoint from discovered to pending for a connection attempt.
    ///
    /// Returns the pending entry, or `None` if the id was not discovered.
    pub fn begin_handshake(&mut self, id: &EndpointId) -> Option<&Endpoint> {
        let endpoint = self.discovered.remove(id)?;
        self.pending.insert(endpoint.id.clone(), endpoint);
        self.pending.get(id)
    }

    /// Register an incoming handshake.
    ///
    /// Displaces any discovered entry with the same id and inserts (or
    /// refreshes) the pending entry. Returns `false` without changing
    /// anything when the id already has an established link.
    pub fn admit(&mut self, endpoint: Endpoint) -> bool {
        if self.connected.contains_key(&endpoint.id) {
            return false;
        }
        self.discovered.remove(&endpoint.id);
        self.pending.insert(endpoint.id.clone(), endpoint);
        true
    }

    /// Move an endpoint from pending to connected.
    ///
    /// Returns the connected entry, or `None` if the id was not pending.
    pub fn establish(&mut self, id: &EndpointId) -> Option<&Endpoint> {
        let endpoint = self.pending.remove(id)?;
        self.connected.insert(endpoint.id.clone(), endpoint);
        self.connected.get(id)
    }

    /// Drop a pending handshake.
    pub fn abandon(&mut self, id: &EndpointId) -> Option<Endpoint> {
        self.pending.remove(id)
    }

    /// Drop a discovered entry.
    pub fn drop_discovered(&mut self, id: &EndpointId) -> Option<Endpoint> {
        self.discovered.remove(id)
    }

    /// Drop an established link.
    pub fn drop_connected(&mut self, id: &EndpointId) -> Option<Endpoint> {
        self.connected.remove(id)
    }

    /// Remove and return every connected endpoint, in id order.
    pub fn take_connected(&mut self) -> Vec<Endpoint> {
        std::mem::take(&mut self.connected).into_values().collect()
    }

    /// Clear discovered and pending entries (role transitions).
    pub fn clear_transient(&mut self) {
        self.discovered.clear();
        self.pending.clear();
    }

    /// Clear every set (shutdown).
    pub fn clear_all(&mut self) {
        self.discovered.clear();
        self.pending.clear();
        self.connected.clear();
    }

    /// True when the id is in the discovered set.
    #[must_use]
    pub fn is_discovered(&self, id: &EndpointId) -> bool {
        self.discovered.contains_key(id)
    }

    /// True when the id has a handshake in flight.
    #[must_use]
    pub fn is_pending(&self, id: &EndpointId) -> bool {
        self.pending.contains_key(id)
    }

    /// True when the id has an established link.
    #[must_use]
    pub fn is_connected(&self, id: &EndpointId) -> bool {
        self.connected.contains_key(id)
    }

    /// True while at least one link is established.
    #[must_use]
    pub fn has_connected(&self) -> bool {
        !self.connected.is_empty()
    }

    /// The retry candidate: first discovered endpoint in id order.
    ///
    /// First by id, no fairness guarantee; a repeatedly failing candidate
    /// with the lowest id starves the rest.
    #[must_use]
    pub fn first_discovered(&self) -> Option<&Endpoint> {
        self.discovered.values().next()
    }

    /// Discovered endpoints, in id order.
    pub fn discovered(&self) -> impl Iterator<Item = &Endpoint> {
        self.discovered.values()
    }

    /// Endpoints with a handshake in flight, in id order.
    pub fn pending(&self) -> impl Iterator<Item = &Endpoint> {
        self.pending.values()
    }

    /// Endpoints with an established link, in id order.
    pub fn connected(&self) -> impl Iterator<Item = &Endpoint> {
        self.connected.values()
    }

    /// Ids of every established link, in id order.
    #[must_use]
    pub fn connected_ids(&self) -> Vec<EndpointId> {
        self.connected.keys().cloned().collect()
    }
}
