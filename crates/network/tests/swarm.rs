use core::time::Duration;

use libp2p::identity::Keypair;
use libp2p::{Multiaddr, PeerId};
use multiaddr::Protocol;
use synapse_network::run;
use synapse_network_primitives::config::{
    BootstrapConfig, DiscoveryConfig, NetworkConfig, SwarmConfig,
};
use synapse_network_primitives::messages::NetworkEvent;
use synapse_network_primitives::transport::Transport;
use tokio::sync::mpsc::Receiver;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

fn config(identity: Keypair) -> NetworkConfig {
    NetworkConfig::new(
        identity,
        SwarmConfig::new(vec!["/ip4/127.0.0.1/tcp/0".parse().unwrap()]),
        BootstrapConfig::default(),
        DiscoveryConfig::new(false),
    )
}

async fn listening_addr(events: &mut Receiver<NetworkEvent>) -> Multiaddr {
    loop {
        match events.recv().await {
            Some(NetworkEvent::ListeningOn { address, .. }) => return address,
            Some(_) => {}
            None => panic!("event feed closed"),
        }
    }
}

async fn next_message(events: &mut Receiver<NetworkEvent>) -> (PeerId, Vec<u8>) {
    loop {
        match events.recv().await {
            Some(NetworkEvent::Message { peer_id, data }) => return (peer_id, data),
            Some(_) => {}
            None => panic!("event feed closed"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_frames_cross_a_live_connection() {
    let a_key = Keypair::generate_ed25519();
    let b_key = Keypair::generate_ed25519();
    let a_peer = a_key.public().to_peer_id();
    let b_peer = b_key.public().to_peer_id();

    let (a, _a_events) = run(&config(a_key)).await.unwrap();
    let (_b, mut b_events) = run(&config(b_key)).await.unwrap();

    let b_addr = timeout(WAIT, listening_addr(&mut b_events)).await.unwrap();

    timeout(WAIT, a.dial(b_addr.with(Protocol::P2p(b_peer))))
        .await
        .unwrap()
        .unwrap();

    timeout(WAIT, a.send(b_peer, b"{\"hello\":\"world\"}\n".to_vec()))
        .await
        .unwrap()
        .unwrap();

    let (from, data) = timeout(WAIT, next_message(&mut b_events)).await.unwrap();

    assert_eq!(from, a_peer);
    assert_eq!(data, br#"{"hello":"world"}"#);
    assert_eq!(a.peer_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_bootstrap_nodes_need_a_peer_id() {
    let mut config = config(Keypair::generate_ed25519());
    config.bootstrap.nodes.list = vec!["/ip4/127.0.0.1/tcp/1".parse().unwrap()];

    assert!(run(&config).await.is_err());
}
