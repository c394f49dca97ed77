use std::collections::BTreeMap;

use libp2p::mdns::Event;
use libp2p::swarm::dial_opts::DialOpts;
use libp2p::{Multiaddr, PeerId};
use owo_colors::OwoColorize;
use synapse_network_primitives::messages::NetworkEvent;
use tracing::{debug, warn};

use super::{EventHandler, EventLoop};

impl EventHandler<Event> for EventLoop {
    async fn handle(&mut self, event: Event) {
        debug!("{}: {:?}", "mdns".yellow(), event);

        match event {
            Event::Discovered(peers) => {
                for (peer_id, addrs) in group_by_peer(peers) {
                    debug!("Discovered {} at {:?}", peer_id, addrs);

                    for addr in &addrs {
                        self.swarm.add_peer_address(peer_id, addr.clone());
                    }

                    if !self.swarm.is_connected(&peer_id) {
                        let opts = DialOpts::peer_id(peer_id)
                            .addresses(addrs.clone())
                            .build();

                        if let Err(err) = self.swarm.dial(opts) {
                            warn!(%peer_id, %err, "Failed to dial discovered peer");
                        }
                    }

                    self.emit(NetworkEvent::PeerDiscovered { peer_id, addrs })
                        .await;
                }
            }
            Event::Expired(peers) => {
                for (peer_id, _) in group_by_peer(peers) {
                    debug!("Expired {}", peer_id);

                    self.emit(NetworkEvent::PeerExpired { peer_id }).await;
                }
            }
        }
    }
}

fn group_by_peer(peers: Vec<(PeerId, Multiaddr)>) -> BTreeMap<PeerId, Vec<Multiaddr>> {
    let mut grouped: BTreeMap<PeerId, Vec<Multiaddr>> = BTreeMap::new();

    for (peer_id, addr) in peers {
        let addrs = grouped.entry(peer_id).or_default();
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }

    grouped
}
