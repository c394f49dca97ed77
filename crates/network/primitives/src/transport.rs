//! The byte-level delivery seam between the protocol core and a peer-to-peer substrate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::{bail, Result as EyreResult};
use libp2p::{Multiaddr, PeerId};
use multiaddr::Protocol;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::messages::NetworkEvent;

/// Delivers one encoded frame to a peer.
///
/// Implementations give no delivery guarantee beyond what the substrate offers and
/// never retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, peer_id: PeerId, data: Vec<u8>) -> EyreResult<()>;
}

const INBOX_CAPACITY: usize = 64;

/// An in-process hub that routes frames between nodes by peer id.
#[derive(Clone, Debug, Default)]
pub struct MemoryNetwork {
    inboxes: Arc<Mutex<HashMap<PeerId, mpsc::Sender<NetworkEvent>>>>,
}

impl MemoryNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `peer_id` on the hub, replacing any earlier registration.
    #[must_use]
    pub fn join(&self, peer_id: PeerId) -> (MemoryTransport, mpsc::Receiver<NetworkEvent>) {
        let (sender, receiver) = mpsc::channel(INBOX_CAPACITY);

        drop(self.inboxes.lock().insert(peer_id, sender));

        let transport = MemoryTransport {
            local_peer_id: peer_id,
            network: self.clone(),
        };

        (transport, receiver)
    }

    pub fn leave(&self, peer_id: &PeerId) {
        drop(self.inboxes.lock().remove(peer_id));
    }

    /// Announces a connection between two registered peers to both of them.
    pub async fn connect(&self, a: PeerId, b: PeerId) -> EyreResult<()> {
        self.deliver(
            b,
            NetworkEvent::PeerConnected {
                peer_id: a,
                addrs: vec![memory_addr(&a)],
            },
        )
        .await?;
        self.deliver(
            a,
            NetworkEvent::PeerConnected {
                peer_id: b,
                addrs: vec![memory_addr(&b)],
            },
        )
        .await
    }

    pub async fn disconnect(&self, a: PeerId, b: PeerId) -> EyreResult<()> {
        self.deliver(b, NetworkEvent::PeerDisconnected { peer_id: a })
            .await?;
        self.deliver(a, NetworkEvent::PeerDisconnected { peer_id: b })
            .await
    }

    async fn deliver(&self, to: PeerId, event: NetworkEvent) -> EyreResult<()> {
        let Some(inbox) = self.inboxes.lock().get(&to).cloned() else {
            bail!("peer {to} is not reachable");
        };

        if inbox.send(event).await.is_err() {
            bail!("peer {to} stopped receiving");
        }

        Ok(())
    }
}

/// Memory transports carry a synthetic `/memory/<n>` address derived from the peer id.
fn memory_addr(peer_id: &PeerId) -> Multiaddr {
    let port = peer_id
        .to_bytes()
        .iter()
        .fold(0_u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(*b)));

    Multiaddr::empty().with(Protocol::Memory(port))
}

#[derive(Clone, Debug)]
pub struct MemoryTransport {
    local_peer_id: PeerId,
    network: MemoryNetwork,
}

impl MemoryTransport {
    #[must_use]
    pub const fn local_peer_id(&self) -> PeerId {
        self.local_peer_id
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, peer_id: PeerId, data: Vec<u8>) -> EyreResult<()> {
        self.network
            .deliver(
                peer_id,
                NetworkEvent::Message {
                    peer_id: self.local_peer_id,
                    data,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_are_routed_by_peer_id() {
        let network = MemoryNetwork::new();
        let a = PeerId::random();
        let b = PeerId::random();

        let (transport_a, _inbox_a) = network.join(a);
        let (_transport_b, mut inbox_b) = network.join(b);

        transport_a.send(b, b"frame".to_vec()).await.unwrap();

        match inbox_b.recv().await {
            Some(NetworkEvent::Message { peer_id, data }) => {
                assert_eq!(peer_id, a);
                assert_eq!(data, b"frame");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_peer_is_an_error() {
        let network = MemoryNetwork::new();
        let a = PeerId::random();
        let (transport, _inbox) = network.join(a);

        assert!(transport.send(PeerId::random(), vec![1]).await.is_err());

        network.leave(&a);
        assert!(transport.send(a, vec![1]).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_notifies_both_sides() {
        let network = MemoryNetwork::new();
        let a = PeerId::random();
        let b = PeerId::random();

        let (_ta, mut inbox_a) = network.join(a);
        let (_tb, mut inbox_b) = network.join(b);

        network.connect(a, b).await.unwrap();

        assert!(matches!(
            inbox_a.recv().await,
            Some(NetworkEvent::PeerConnected { peer_id, ref addrs }) if peer_id == b && addrs.len() == 1
        ));
        assert!(matches!(
            inbox_b.recv().await,
            Some(NetworkEvent::PeerConnected { peer_id, .. }) if peer_id == a
        ));
    }
}
