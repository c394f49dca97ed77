use std::collections::HashMap;

use eyre::{bail, Result as EyreResult};
use futures_util::StreamExt;
use libp2p::identify::{Behaviour as IdentifyBehaviour, Config as IdentifyConfig};
use libp2p::mdns::tokio::Behaviour as MdnsTokioBehaviour;
use libp2p::mdns::{Behaviour as MdnsBehaviour, Config as MdnsConfig};
use libp2p::noise::Config as NoiseConfig;
use libp2p::ping::Behaviour as PingBehaviour;
use libp2p::swarm::behaviour::toggle::Toggle;
use libp2p::swarm::{NetworkBehaviour, Swarm};
use libp2p::tcp::Config as TcpConfig;
use libp2p::yamux::Config as YamuxConfig;
use libp2p::{Multiaddr, PeerId, SwarmBuilder};
use libp2p_stream::{Behaviour as StreamBehaviour, IncomingStreams};
use multiaddr::Protocol;
use synapse_network_primitives::client::{NetworkClient, NetworkMessage};
use synapse_network_primitives::config::NetworkConfig;
use synapse_network_primitives::messages::NetworkEvent;
use synapse_network_primitives::stream::SYNAPSE_STREAM_PROTOCOL;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;
use tokio::{select, spawn};
use tracing::{debug, warn};

mod commands;
mod events;
mod stream;

const PROTOCOL_VERSION: &str = concat!("/", env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(NetworkBehaviour)]
struct Behaviour {
    identify: IdentifyBehaviour,
    mdns: Toggle<MdnsTokioBehaviour>,
    ping: PingBehaviour,
    stream: StreamBehaviour,
}

/// Starts the swarm on a background task and returns a handle plus its event feed.
pub async fn run(
    config: &NetworkConfig,
) -> EyreResult<(NetworkClient, mpsc::Receiver<NetworkEvent>)> {
    let peer_id = config.identity.public().to_peer_id();

    let (client, event_receiver, event_loop) = init(peer_id, config)?;

    drop(spawn(event_loop.run()));

    for addr in &config.swarm.listen {
        client.listen_on(addr.clone()).await?;
    }

    if let Err(err) = client.bootstrap().await {
        warn!(%err, "Failed to reach any bootstrap node");
    }

    Ok((client, event_receiver))
}

fn init(
    peer_id: PeerId,
    config: &NetworkConfig,
) -> EyreResult<(NetworkClient, mpsc::Receiver<NetworkEvent>, EventLoop)> {
    let bootstrap_peers = {
        let mut peers = vec![];

        for mut addr in config.bootstrap.nodes.list.iter().cloned() {
            let Some(Protocol::P2p(peer_id)) = addr.pop() else {
                bail!("Failed to parse peer id from addr {:?}", addr);
            };

            peers.push((peer_id, addr));
        }

        peers
    };

    let swarm = SwarmBuilder::with_existing_identity(config.identity.clone())
        .with_tokio()
        .with_tcp(TcpConfig::default(), NoiseConfig::new, YamuxConfig::default)?
        .with_behaviour(|key| Behaviour {
            identify: IdentifyBehaviour::new(
                IdentifyConfig::new(PROTOCOL_VERSION.to_owned(), key.public())
                    .with_push_listen_addr_updates(true),
            ),
            mdns: config
                .discovery
                .mdns
                .then_some(())
                .and_then(|()| MdnsBehaviour::new(MdnsConfig::default(), peer_id).ok())
                .into(),
            ping: PingBehaviour::default(),
            stream: StreamBehaviour::new(),
        })?
        .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(Duration::from_secs(60)))
        .build();

    let mut control = swarm.behaviour().stream.new_control();

    let incoming_streams = match control.accept(SYNAPSE_STREAM_PROTOCOL) {
        Ok(incoming_streams) => incoming_streams,
        Err(err) => {
            bail!("Failed to setup control for stream protocol: {:?}", err)
        }
    };

    let (command_sender, command_receiver) = mpsc::channel(32);
    let (event_sender, event_receiver) = mpsc::channel(32);

    let client = NetworkClient::new(command_sender, control);

    let event_loop = EventLoop::new(
        swarm,
        incoming_streams,
        command_receiver,
        event_sender,
        bootstrap_peers,
    );

    Ok((client, event_receiver, event_loop))
}

pub(crate) struct EventLoop {
    swarm: Box<Swarm<Behaviour>>,
    incoming_streams: Box<IncomingStreams>,
    command_receiver: mpsc::Receiver<NetworkMessage>,
    event_sender: mpsc::Sender<NetworkEvent>,
    bootstrap_peers: Vec<(PeerId, Multiaddr)>,
    pending_dial: HashMap<PeerId, oneshot::Sender<EyreResult<()>>>,
}

impl EventLoop {
    fn new(
        swarm: Swarm<Behaviour>,
        incoming_streams: IncomingStreams,
        command_receiver: mpsc::Receiver<NetworkMessage>,
        event_sender: mpsc::Sender<NetworkEvent>,
        bootstrap_peers: Vec<(PeerId, Multiaddr)>,
    ) -> Self {
        Self {
            swarm: Box::new(swarm),
            incoming_streams: Box::new(incoming_streams),
            command_receiver,
            event_sender,
            bootstrap_peers,
            pending_dial: HashMap::default(),
        }
    }

    pub(crate) async fn run(mut self) {
        #[expect(clippy::redundant_pub_crate, reason = "Needed for Tokio code")]
        loop {
            select! {
                Some(event) = self.swarm.next() => {
                    self.handle_swarm_event(event).await;
                },
                Some(incoming_stream) = self.incoming_streams.next() => {
                    self.handle_incoming_stream(incoming_stream);
                },
                command = self.command_receiver.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                }
            }
        }

        debug!("Network event loop stopped");
    }

    async fn emit(&mut self, event: NetworkEvent) {
        if self.event_sender.send(event).await.is_err() {
            warn!("Network event receiver dropped");
        }
    }
}
