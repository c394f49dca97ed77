use tracing::warn;

use crate::router::Inbound;

/// Replies reach this point after the messenger has seen them; only stragglers need a log.
pub fn handle(inbound: &Inbound) {
    if !inbound.correlated {
        warn!(
            peer_id = %inbound.peer_id,
            request_id = inbound.envelope.request_id(),
            message_type = %inbound.envelope.message_type(),
            "Dropping reply with no pending request"
        );
    }
}
