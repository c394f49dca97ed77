//! The public-key handshake plus peer announce/disconnect.
//!
//! Per peer the handshake moves `Unknown -> KeyRequested -> KeyObtained`; independently of
//! that, our own key is sent to each peer at most once. The send claim is taken atomically
//! in the [`PeerRegistry`](crate::peers::PeerRegistry) and released if the send fails.

use libp2p::{Multiaddr, PeerId};
use serde_json::Value;
use synapse_network_primitives::envelope::{Envelope, Meta, Payload};
use synapse_network_primitives::types::{ActionType, MessageType, ResourceType};
use tracing::{debug, info, warn};

use super::payload;
use crate::router::Inbound;
use crate::NodeContext;

/// Peer state is only ever changed for the peer the transport delivered the envelope from,
/// whatever `meta.sender` claims.
pub async fn handle(ctx: &NodeContext, inbound: &Inbound) {
    let peer_id = inbound.peer_id;
    let envelope = &inbound.envelope;

    if inbound.origin() != peer_id {
        debug!(%peer_id, sender = envelope.sender(), "Sender differs from delivering peer");
    }

    match envelope.message_type() {
        MessageType::PeerAnnounce => announce(ctx, peer_id, envelope),
        MessageType::PeerDisconnect => {
            info!(%peer_id, "Synapse announced disconnect");
            drop(ctx.registry.remove_discovered_peer(&peer_id));
        }
        _ => match envelope.action_type() {
            ActionType::RequestPublicKey => send_public_key(ctx, peer_id, envelope).await,
            ActionType::ResponsePublicKey => receive_public_key(ctx, peer_id, envelope).await,
            action_type => {
                warn!(%peer_id, %action_type, "Unknown peer action, ignoring");
            }
        },
    }
}

/// Opens the handshake with a freshly connected peer.
///
/// The caller must hold the key-request claim for `peer_id`; it is released when the
/// request cannot be delivered.
pub async fn request_public_key(ctx: &NodeContext, peer_id: PeerId) {
    let request = Envelope::new(
        MessageType::PeerRequest,
        ActionType::RequestPublicKey,
        ResourceType::PeerPublicKey,
        Payload::new(),
        Meta::new(ctx.sender()),
    );

    if let Err(err) = ctx.messenger.send(peer_id, &request).await {
        ctx.registry.release_key_request(&peer_id);
        warn!(%peer_id, %err, "Failed to request public key");
        return;
    }

    debug!(%peer_id, "Requested public key");
}

async fn send_public_key(ctx: &NodeContext, peer_id: PeerId, answering: &Envelope) {
    let _ = ctx.registry.add_discovered_peer(peer_id, []);

    if !ctx.registry.try_claim_public_key_send(peer_id) {
        debug!(%peer_id, "Public key already sent");
        return;
    }

    let response = answering.reply(
        MessageType::PeerResponse,
        ActionType::ResponsePublicKey,
        payload([(
            "publicKey",
            Value::String(ctx.identity.public_key.clone()),
        )]),
        ctx.sender(),
    );

    if let Err(err) = ctx.messenger.send(peer_id, &response).await {
        ctx.registry.release_public_key_send(&peer_id);
        warn!(%peer_id, %err, "Failed to send public key");
        return;
    }

    debug!(%peer_id, "Sent public key");
}

async fn receive_public_key(ctx: &NodeContext, peer_id: PeerId, envelope: &Envelope) {
    let Some(public_key) = envelope.payload_str("publicKey") else {
        warn!(%peer_id, "Public key response without a key, ignoring");
        return;
    };

    let _ = ctx.registry.add_discovered_peer(peer_id, []);
    let _ = ctx.registry.update_peer_public_key(&peer_id, public_key);

    info!(%peer_id, public_key, "Handshake completed");

    send_public_key(ctx, peer_id, envelope).await;
}

fn announce(ctx: &NodeContext, peer_id: PeerId, envelope: &Envelope) {
    let addrs = envelope
        .payload()
        .get("multiaddrs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|addr| addr.parse::<Multiaddr>().ok());

    ctx.registry.merge_multiaddrs(peer_id, addrs);

    if let Some(public_key) = envelope.payload_str("publicKey") {
        let _ = ctx.registry.update_peer_public_key(&peer_id, public_key);
    }

    debug!(%peer_id, "Applied peer announcement");
}
