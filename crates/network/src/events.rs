use libp2p::swarm::SwarmEvent;
use owo_colors::OwoColorize;
use synapse_network_primitives::messages::NetworkEvent;
use tracing::{debug, info, warn};

use crate::{BehaviourEvent, EventLoop};

mod identify;
mod mdns;
mod ping;

pub(crate) trait EventHandler<E> {
    async fn handle(&mut self, event: E);
}

impl EventLoop {
    pub(crate) async fn handle_swarm_event(&mut self, event: SwarmEvent<BehaviourEvent>) {
        match event {
            SwarmEvent::Behaviour(event) => match event {
                BehaviourEvent::Identify(event) => EventHandler::handle(self, event).await,
                BehaviourEvent::Mdns(event) => EventHandler::handle(self, event).await,
                BehaviourEvent::Ping(event) => EventHandler::handle(self, event).await,
                BehaviourEvent::Stream(_) => {}
            },
            SwarmEvent::NewListenAddr {
                listener_id,
                address,
            } => {
                let local_peer_id = *self.swarm.local_peer_id();
                info!("Listening on {}/p2p/{}", address, local_peer_id.green());

                self.emit(NetworkEvent::ListeningOn {
                    listener_id,
                    address,
                })
                .await;
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                ..
            } => {
                debug!(%peer_id, ?endpoint, "Connection established");

                if let Some(sender) = self.pending_dial.remove(&peer_id) {
                    let _ignored = sender.send(Ok(()));
                }

                if num_established.get() == 1 {
                    self.emit(NetworkEvent::PeerConnected {
                        peer_id,
                        addrs: vec![endpoint.get_remote_address().clone()],
                    })
                    .await;
                }
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                num_established,
                cause,
                ..
            } => {
                debug!(%peer_id, ?cause, num_established, "Connection closed");

                if num_established == 0 {
                    self.emit(NetworkEvent::PeerDisconnected { peer_id }).await;
                }
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                warn!(?peer_id, %error, "Outgoing connection error");

                if let Some(peer_id) = peer_id {
                    if let Some(sender) = self.pending_dial.remove(&peer_id) {
                        let _ignored = sender.send(Err(error.into()));
                    }
                }
            }
            SwarmEvent::IncomingConnectionError { error, .. } => {
                debug!(%error, "Incoming connection error");
            }
            SwarmEvent::Dialing {
                peer_id: Some(peer_id),
                ..
            } => debug!("Dialing peer: {}", peer_id),
            unhandled => debug!("Unhandled swarm event: {:?}", unhandled),
        }
    }
}
