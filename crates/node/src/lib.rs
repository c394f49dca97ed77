//! The Synapse federation node.
//!
//! A [`Node`] consumes [`NetworkEvent`]s from whichever substrate carries its traffic, keeps
//! the [`PeerRegistry`] current, and hands every inbound frame to the [dispatch
//! router](router). Outbound federation calls go through [`RemoteResources`](proxy::RemoteResources).

use core::fmt::{self, Debug, Formatter};
use core::time::Duration;
use std::sync::Arc;

use libp2p::PeerId;
use synapse_network_primitives::messages::NetworkEvent;
use synapse_network_primitives::transport::Transport;
use tokio::spawn;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::messenger::Messenger;
use crate::peers::PeerRegistry;
use crate::resources::ResourceProvider;

pub mod handlers;
pub mod messenger;
pub mod peers;
pub mod proxy;
pub mod resources;
pub mod router;

/// Who this node is on the federation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocalIdentity {
    pub peer_id: PeerId,
    pub public_key: String,
    pub name: String,
}

/// Shared services handed to every handler and proxy call.
#[derive(Clone)]
pub struct NodeContext {
    pub identity: Arc<LocalIdentity>,
    pub registry: Arc<PeerRegistry>,
    pub messenger: Arc<Messenger>,
    pub resources: Arc<dyn ResourceProvider>,
    pub request_timeout: Duration,
}

impl Debug for NodeContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("identity", &self.identity)
            .field("registry", &self.registry)
            .field("messenger", &self.messenger)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl NodeContext {
    #[must_use]
    pub fn new(
        identity: LocalIdentity,
        transport: Arc<dyn Transport>,
        resources: Arc<dyn ResourceProvider>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            registry: Arc::new(PeerRegistry::new()),
            messenger: Arc::new(Messenger::new(transport)),
            resources,
            request_timeout,
        }
    }

    /// The `meta.sender` value stamped on everything this node sends.
    #[must_use]
    pub fn sender(&self) -> String {
        self.identity.peer_id.to_base58()
    }
}

#[derive(Debug)]
pub struct Node {
    ctx: NodeContext,
}

impl Node {
    #[must_use]
    pub const fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub const fn context(&self) -> &NodeContext {
        &self.ctx
    }

    /// Processes network events until the substrate closes its channel.
    pub async fn run(self, mut events: mpsc::Receiver<NetworkEvent>) {
        info!(
            peer_id = %self.ctx.identity.peer_id,
            name = %self.ctx.identity.name,
            "Synapse node started"
        );

        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }

        info!("Network event stream closed, stopping node");
    }

    fn handle_event(&self, event: NetworkEvent) {
        let registry = &self.ctx.registry;

        match event {
            NetworkEvent::ListeningOn { address, .. } => {
                info!(%address, "Listening for federation traffic");
            }
            NetworkEvent::PeerDiscovered { peer_id, addrs } => {
                if registry.add_discovered_peer(peer_id, addrs.iter().cloned()) {
                    info!(%peer_id, "Discovered synapse");
                } else {
                    registry.merge_multiaddrs(peer_id, addrs);
                }
            }
            NetworkEvent::PeerExpired { peer_id } => {
                if !registry.is_peer_connected(&peer_id) {
                    debug!(%peer_id, "Discovery record expired");
                    drop(registry.remove_discovered_peer(&peer_id));
                }
            }
            NetworkEvent::PeerConnected { peer_id, addrs } => {
                registry.merge_multiaddrs(peer_id, addrs);
                registry.add_connected_peer(peer_id);

                if registry.try_claim_key_request(peer_id) {
                    let ctx = self.ctx.clone();
                    drop(spawn(async move {
                        handlers::peer::request_public_key(&ctx, peer_id).await;
                    }));
                }
            }
            NetworkEvent::PeerDisconnected { peer_id } => {
                info!(%peer_id, "Synapse disconnected");
                drop(registry.remove_discovered_peer(&peer_id));
            }
            NetworkEvent::PeerAddresses { peer_id, addrs } => {
                registry.merge_multiaddrs(peer_id, addrs);
            }
            NetworkEvent::Message { peer_id, data } => {
                let ctx = self.ctx.clone();
                drop(spawn(async move {
                    router::ingest(&ctx, peer_id, &data).await;
                }));
            }
            _ => {}
        }
    }
}
