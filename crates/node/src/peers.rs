//! Peer State Store.
//!
//! Every discovered remote Synapse has one [`PeerRecord`], owned by the [`PeerRegistry`].
//! Callers only go through the registry's accessors; records are handed out as copies.
//!
//! All state sits behind a single lock so that check-then-set sequences such as
//! [`PeerRegistry::try_claim_public_key_send`] are atomic with respect to concurrent
//! inbound messages for the same peer.

#[cfg(test)]
#[path = "tests/peers.rs"]
mod tests;

use std::collections::{btree_map, BTreeMap, BTreeSet, HashSet};

use libp2p::{Multiaddr, PeerId};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PeerRecord {
    pub public_key: Option<String>,
    pub addrs: HashSet<Multiaddr>,
    key_requested: bool,
}

impl PeerRecord {
    fn handshake_state(&self) -> HandshakeState {
        if self.public_key.is_some() {
            HandshakeState::KeyObtained
        } else if self.key_requested {
            HandshakeState::KeyRequested
        } else {
            HandshakeState::Unknown
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandshakeState {
    Unknown,
    KeyRequested,
    KeyObtained,
}

/// A point-in-time view of one peer, as shown on the admin API.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    pub peer_id: String,
    pub public_key: Option<String>,
    pub multiaddrs: Vec<String>,
    pub connected: bool,
    pub public_key_sent: bool,
    pub handshake: HandshakeState,
}

#[derive(Debug, Default)]
struct PeerState {
    discovered: BTreeMap<PeerId, PeerRecord>,
    connected: BTreeSet<PeerId>,
    key_sent: BTreeSet<PeerId>,
}

#[derive(Debug, Default)]
pub struct PeerRegistry {
    state: Mutex<PeerState>,
}

impl PeerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh record unless the peer is already known. Returns whether it inserted.
    pub fn add_discovered_peer<I>(&self, peer_id: PeerId, addrs: I) -> bool
    where
        I: IntoIterator<Item = Multiaddr>,
    {
        match self.state.lock().discovered.entry(peer_id) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(entry) => {
                let _ = entry.insert(PeerRecord {
                    addrs: addrs.into_iter().collect(),
                    ..PeerRecord::default()
                });
                true
            }
        }
    }

    /// Unions `addrs` into the peer's address set, creating the record if needed.
    pub fn merge_multiaddrs<I>(&self, peer_id: PeerId, addrs: I)
    where
        I: IntoIterator<Item = Multiaddr>,
    {
        self.state
            .lock()
            .discovered
            .entry(peer_id)
            .or_default()
            .addrs
            .extend(addrs);
    }

    /// Sets the public key of a known peer. Unknown peers are ignored.
    pub fn update_peer_public_key(&self, peer_id: &PeerId, public_key: impl Into<String>) -> bool {
        let mut state = self.state.lock();

        let Some(record) = state.discovered.get_mut(peer_id) else {
            return false;
        };

        record.public_key = Some(public_key.into());
        record.key_requested = false;

        true
    }

    pub fn mark_public_key_sent_to(&self, peer_id: PeerId) {
        let _ = self.state.lock().key_sent.insert(peer_id);
    }

    #[must_use]
    pub fn has_sent_public_key_to(&self, peer_id: &PeerId) -> bool {
        self.state.lock().key_sent.contains(peer_id)
    }

    /// Atomically checks and marks that our key goes to `peer_id`.
    ///
    /// Returns `true` for exactly one caller per peer until the claim is released.
    #[must_use]
    pub fn try_claim_public_key_send(&self, peer_id: PeerId) -> bool {
        self.state.lock().key_sent.insert(peer_id)
    }

    /// Undoes a claim whose send failed so that a later request can retry.
    pub fn release_public_key_send(&self, peer_id: &PeerId) {
        let _ = self.state.lock().key_sent.remove(peer_id);
    }

    /// Atomically moves a peer from `Unknown` to `KeyRequested`.
    ///
    /// Returns `false` when the key is already known or a request is outstanding.
    #[must_use]
    pub fn try_claim_key_request(&self, peer_id: PeerId) -> bool {
        let mut state = self.state.lock();
        let record = state.discovered.entry(peer_id).or_default();

        if record.handshake_state() != HandshakeState::Unknown {
            return false;
        }

        record.key_requested = true;

        true
    }

    pub fn release_key_request(&self, peer_id: &PeerId) {
        if let Some(record) = self.state.lock().discovered.get_mut(peer_id) {
            record.key_requested = false;
        }
    }

    /// Forgets the peer entirely, including its connection and key-sent markers.
    pub fn remove_discovered_peer(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        let mut state = self.state.lock();

        let _ = state.connected.remove(peer_id);
        let _ = state.key_sent.remove(peer_id);

        state.discovered.remove(peer_id)
    }

    pub fn add_connected_peer(&self, peer_id: PeerId) {
        let _ = self.state.lock().connected.insert(peer_id);
    }

    pub fn remove_connected_peer(&self, peer_id: &PeerId) {
        let _ = self.state.lock().connected.remove(peer_id);
    }

    #[must_use]
    pub fn is_peer_connected(&self, peer_id: &PeerId) -> bool {
        self.state.lock().connected.contains(peer_id)
    }

    /// First discovered peer, in peer id order, whose public key equals `public_key`.
    #[must_use]
    pub fn get_peer_by_public_key(&self, public_key: &str) -> Option<PeerId> {
        self.state
            .lock()
            .discovered
            .iter()
            .find(|(_, record)| record.public_key.as_deref() == Some(public_key))
            .map(|(peer_id, _)| *peer_id)
    }

    #[must_use]
    pub fn peer(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        self.state.lock().discovered.get(peer_id).cloned()
    }

    #[must_use]
    pub fn handshake_state(&self, peer_id: &PeerId) -> HandshakeState {
        self.state
            .lock()
            .discovered
            .get(peer_id)
            .map_or(HandshakeState::Unknown, PeerRecord::handshake_state)
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.state.lock().discovered.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerSnapshot> {
        let state = self.state.lock();

        state
            .discovered
            .iter()
            .map(|(peer_id, record)| {
                let mut multiaddrs: Vec<_> = record.addrs.iter().map(ToString::to_string).collect();
                multiaddrs.sort();

                PeerSnapshot {
                    peer_id: peer_id.to_string(),
                    public_key: record.public_key.clone(),
                    multiaddrs,
                    connected: state.connected.contains(peer_id),
                    public_key_sent: state.key_sent.contains(peer_id),
                    handshake: record.handshake_state(),
                }
            })
            .collect()
    }
}
