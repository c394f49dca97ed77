//! Dispatch Router.
//!
//! Every validated envelope goes through [`route`]. Replies are first offered to the
//! [`Messenger`](crate::messenger::Messenger) so a waiting request resolves before any handler runs.

#[cfg(test)]
#[path = "tests/router.rs"]
mod tests;

use libp2p::PeerId;
use synapse_network_primitives::envelope::Envelope;
use synapse_network_primitives::types::MessageType;
use tracing::{debug, warn};

use crate::handlers::{data, health, peer, reply};
use crate::NodeContext;

/// The handler family responsible for a message type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Route {
    Peer,
    Health,
    Data,
    Reply,
}

/// The handler directory. `None` means the type is understood on the wire but not served.
#[must_use]
pub const fn route_for(message_type: MessageType) -> Option<Route> {
    match message_type {
        MessageType::PeerRequest
        | MessageType::PeerResponse
        | MessageType::PeerAnnounce
        | MessageType::PeerDisconnect => Some(Route::Peer),
        MessageType::HealthCheck | MessageType::HealthStatus => Some(Route::Health),
        MessageType::DataRequest => Some(Route::Data),
        MessageType::DataResponse | MessageType::DataError | MessageType::SyncResponse => {
            Some(Route::Reply)
        }
        MessageType::SyncRequest
        | MessageType::SyncUpdate
        | MessageType::Broadcast
        | MessageType::DirectMessage
        | MessageType::ActionTrigger
        | MessageType::ActionEmit => None,
    }
}

/// A validated envelope together with the connection it arrived on.
#[derive(Debug)]
pub struct Inbound {
    pub peer_id: PeerId,
    pub envelope: Envelope,
    /// Whether the envelope answered a request this node was waiting on.
    pub correlated: bool,
}

impl Inbound {
    /// Where replies to health and data requests go: `meta.sender` when it is a peer id,
    /// otherwise the peer on the other end of the connection. Peer state is keyed on
    /// `peer_id` instead.
    #[must_use]
    pub fn origin(&self) -> PeerId {
        self.envelope.sender().parse().unwrap_or(self.peer_id)
    }
}

/// Decodes, validates and routes one frame. Anything malformed is logged and dropped.
pub async fn ingest(ctx: &NodeContext, peer_id: PeerId, data: &[u8]) {
    let envelope = match Envelope::from_slice(data) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(%peer_id, %err, "Dropping undecodable envelope");
            return;
        }
    };

    route(ctx, peer_id, envelope).await;
}

pub async fn route(ctx: &NodeContext, peer_id: PeerId, envelope: Envelope) {
    let message_type = envelope.message_type();

    debug!(
        %peer_id,
        %message_type,
        action_type = %envelope.action_type(),
        request_id = envelope.request_id(),
        "Routing envelope"
    );

    let correlated = message_type.is_reply() && ctx.messenger.resolve(envelope.clone());

    let Some(route) = route_for(message_type) else {
        warn!(%peer_id, %message_type, "No handler for message type, dropping");
        return;
    };

    let inbound = Inbound {
        peer_id,
        envelope,
        correlated,
    };

    match route {
        Route::Peer => peer::handle(ctx, &inbound).await,
        Route::Health => health::handle(ctx, &inbound).await,
        Route::Data => data::handle(ctx, &inbound).await,
        Route::Reply => reply::handle(&inbound),
    }
}
