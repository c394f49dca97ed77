use libp2p::identify::Event;
use owo_colors::OwoColorize;
use synapse_network_primitives::messages::NetworkEvent;
use tracing::debug;

use super::{EventHandler, EventLoop};

impl EventHandler<Event> for EventLoop {
    async fn handle(&mut self, event: Event) {
        debug!("{}: {:?}", "identify".yellow(), event);

        if let Event::Received { peer_id, info, .. } = event {
            for addr in &info.listen_addrs {
                self.swarm.add_peer_address(peer_id, addr.clone());
            }

            self.emit(NetworkEvent::PeerAddresses {
                peer_id,
                addrs: info.listen_addrs,
            })
            .await;
        }
    }
}
