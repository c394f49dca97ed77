use libp2p::core::transport::ListenerId;
use libp2p::{Multiaddr, PeerId};

/// What the swarm reports to the node.
#[derive(Debug)]
#[non_exhaustive]
pub enum NetworkEvent {
    ListeningOn {
        listener_id: ListenerId,
        address: Multiaddr,
    },
    PeerDiscovered {
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
    },
    PeerExpired {
        peer_id: PeerId,
    },
    PeerConnected {
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
    },
    PeerDisconnected {
        peer_id: PeerId,
    },
    PeerAddresses {
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
    },
    Message {
        peer_id: PeerId,
        data: Vec<u8>,
    },
}

#[derive(Clone, Debug)]
pub struct Dial(pub Multiaddr);

impl From<Multiaddr> for Dial {
    fn from(addr: Multiaddr) -> Self {
        Self(addr)
    }
}

#[derive(Clone, Debug)]
pub struct ListenOn(pub Multiaddr);

impl From<Multiaddr> for ListenOn {
    fn from(addr: Multiaddr) -> Self {
        Self(addr)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Bootstrap;

#[derive(Clone, Copy, Debug)]
pub struct PeerCount;
