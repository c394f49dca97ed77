use serde_json::Value;
use synapse_network_primitives::envelope::now_millis;
use synapse_network_primitives::types::{ActionType, MessageType};
use tracing::{debug, warn};

use super::payload;
use crate::router::Inbound;
use crate::NodeContext;

pub async fn handle(ctx: &NodeContext, inbound: &Inbound) {
    let origin = inbound.origin();
    let envelope = &inbound.envelope;

    match (envelope.message_type(), envelope.action_type()) {
        (MessageType::HealthCheck, ActionType::Ping) => {
            let pong = envelope.reply(
                MessageType::HealthStatus,
                ActionType::Pong,
                payload([
                    ("status", Value::from("ok")),
                    ("name", Value::from(ctx.identity.name.as_str())),
                    ("publicKey", Value::from(ctx.identity.public_key.as_str())),
                    ("timestamp", Value::from(now_millis())),
                ]),
                ctx.sender(),
            );

            if let Err(err) = ctx.messenger.send(origin, &pong).await {
                warn!(peer_id = %origin, %err, "Failed to answer ping");
            }
        }
        (_, ActionType::Pong) => {
            debug!(
                peer_id = %origin,
                correlated = inbound.correlated,
                "Received pong"
            );
        }
        (message_type, action_type) => {
            warn!(
                peer_id = %origin,
                %message_type,
                %action_type,
                "Unknown health action, ignoring"
            );
        }
    }
}
