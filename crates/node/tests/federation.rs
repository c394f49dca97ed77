use core::time::Duration;
use std::sync::Arc;

use libp2p::PeerId;
use serde_json::json;
use synapse_network_primitives::envelope::Payload;
use synapse_network_primitives::transport::MemoryNetwork;
use synapse_network_primitives::types::{ActionType, MessageType, ResourceType};
use synapse_node::peers::HandshakeState;
use synapse_node::proxy::{ProxyError, RemoteResources};
use synapse_node::resources::{InMemoryResources, Seed};
use synapse_node::{LocalIdentity, Node, NodeContext};
use tokio::time::{sleep, timeout};

struct Synapse {
    peer_id: PeerId,
    ctx: NodeContext,
    remote: RemoteResources,
}

fn start(network: &MemoryNetwork, name: &str, seed: Seed, request_timeout: Duration) -> Synapse {
    let peer_id = PeerId::random();
    let (transport, events) = network.join(peer_id);

    let ctx = NodeContext::new(
        LocalIdentity {
            peer_id,
            public_key: format!("{name}-key"),
            name: name.to_owned(),
        },
        Arc::new(transport),
        Arc::new(InMemoryResources::from_seed(seed)),
        request_timeout,
    );

    drop(tokio::spawn(Node::new(ctx.clone()).run(events)));

    Synapse {
        peer_id,
        remote: RemoteResources::new(ctx.clone()),
        ctx,
    }
}

fn blog_seed() -> Seed {
    serde_json::from_value(json!({
        "metadata": { "name": "beta", "description": "a test synapse" },
        "users": [{ "id": "u-1", "username": "ada" }],
        "posts": [{ "id": "p-1", "title": "hello", "authorId": "u-1" }],
        "comments": [
            { "id": "c-1", "postId": "p-1", "body": "first" },
            { "id": "c-2", "postId": "p-1", "body": "second" },
            { "id": "c-3", "postId": "p-2", "body": "elsewhere" },
        ],
    }))
    .unwrap()
}

async fn handshaken(network: &MemoryNetwork) -> (Synapse, Synapse) {
    let alpha = start(network, "alpha", Seed::default(), Duration::from_secs(5));
    let beta = start(network, "beta", blog_seed(), Duration::from_secs(5));

    network.connect(alpha.peer_id, beta.peer_id).await.unwrap();

    timeout(Duration::from_secs(5), async {
        loop {
            let converged = alpha.ctx.registry.get_peer_by_public_key("beta-key")
                == Some(beta.peer_id)
                && beta.ctx.registry.get_peer_by_public_key("alpha-key") == Some(alpha.peer_id)
                && alpha.ctx.registry.has_sent_public_key_to(&beta.peer_id)
                && beta.ctx.registry.has_sent_public_key_to(&alpha.peer_id);

            if converged {
                break;
            }

            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("handshake did not converge");

    (alpha, beta)
}

#[tokio::test]
async fn test_handshake_converges() {
    let network = MemoryNetwork::new();
    let (alpha, beta) = handshaken(&network).await;

    assert_eq!(
        alpha.ctx.registry.handshake_state(&beta.peer_id),
        HandshakeState::KeyObtained
    );
    assert_eq!(
        beta.ctx.registry.handshake_state(&alpha.peer_id),
        HandshakeState::KeyObtained
    );
    assert!(alpha.ctx.registry.is_peer_connected(&beta.peer_id));
    assert!(beta.ctx.registry.is_peer_connected(&alpha.peer_id));
}

#[tokio::test]
async fn test_ping_remote() {
    let network = MemoryNetwork::new();
    let (alpha, _beta) = handshaken(&network).await;

    let pong = alpha.remote.ping_remote(Some("beta-key")).await.unwrap();

    assert_eq!(pong["status"], "ok");
    assert_eq!(pong["name"], "beta");
    assert_eq!(pong["publicKey"], "beta-key");
}

#[tokio::test]
async fn test_fetch_remote_resources() {
    let network = MemoryNetwork::new();
    let (alpha, _beta) = handshaken(&network).await;

    let post = alpha
        .remote
        .fetch_remote_post(Some("beta-key"), Some("p-1"))
        .await
        .unwrap();
    assert_eq!(post["title"], "hello");

    let comments = alpha
        .remote
        .fetch_remote_comments(Some("beta-key"), Some("p-1"))
        .await
        .unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 2);

    let users = alpha.remote.fetch_remote_users(Some("beta-key")).await.unwrap();
    assert_eq!(users, json!([{ "id": "u-1", "username": "ada" }]));

    let metadata = alpha
        .remote
        .fetch_remote_metadata(Some("beta-key"))
        .await
        .unwrap();
    assert_eq!(metadata["name"], "beta");

    let err = alpha
        .remote
        .fetch_remote_post(Some("beta-key"), Some("p-404"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::Remote { status: 404, .. }));
    assert_eq!(err.status(), 404);

    assert_eq!(alpha.ctx.messenger.pending_count(), 0);
}

#[tokio::test]
async fn test_remote_writes_are_refused() {
    let network = MemoryNetwork::new();
    let (alpha, _beta) = handshaken(&network).await;

    let err = alpha
        .remote
        .request(
            Some("beta-key"),
            MessageType::DataRequest,
            ActionType::Delete,
            ResourceType::Post,
            json!({ "postId": "p-1" }).as_object().cloned().unwrap(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), 405);
}

#[tokio::test]
async fn test_validation_and_lookup_failures() {
    let network = MemoryNetwork::new();
    let (alpha, _beta) = handshaken(&network).await;

    let err = alpha
        .remote
        .fetch_remote_post(None, Some("p-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::MissingParameter("synapsePublicKey")));

    let err = alpha
        .remote
        .fetch_remote_post(Some("beta-key"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::MissingParameter("postId")));

    let err = alpha
        .remote
        .fetch_remote_user(Some("gamma-key"), Some("u-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::PeerNotFound(ref key) if key == "gamma-key"));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_unresponsive_peer_times_out() {
    let network = MemoryNetwork::new();
    let alpha = start(
        &network,
        "alpha",
        Seed::default(),
        Duration::from_millis(200),
    );

    // Joined to the hub but never processing its inbox.
    let silent = PeerId::random();
    let (_transport, _events) = network.join(silent);

    let _ = alpha.ctx.registry.add_discovered_peer(silent, []);
    let _ = alpha.ctx.registry.update_peer_public_key(&silent, "silent-key");

    let err = alpha
        .remote
        .fetch(
            Some("silent-key"),
            ActionType::Fetch,
            ResourceType::SynapseMetadata,
            Payload::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::Timeout(_)));
    assert_eq!(err.status(), 504);
    assert_eq!(alpha.ctx.messenger.pending_count(), 0);
}

#[tokio::test]
async fn test_disconnect_forgets_peer() {
    let network = MemoryNetwork::new();
    let (alpha, beta) = handshaken(&network).await;

    network.disconnect(alpha.peer_id, beta.peer_id).await.unwrap();

    timeout(Duration::from_secs(5), async {
        while alpha.ctx.registry.peer(&beta.peer_id).is_some() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("peer record was not removed");

    let err = alpha
        .remote
        .ping_remote(Some("beta-key"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::PeerNotFound(_)));
}
