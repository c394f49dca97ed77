//! Serves `DATA_REQUEST`s from the local [`ResourceProvider`](crate::resources::ResourceProvider).
//!
//! Peers may only read. Write actions are answered with a 405 `DATA_ERROR`.

use serde_json::Value;
use synapse_network_primitives::envelope::Envelope;
use synapse_network_primitives::types::{ActionType, MessageType};
use tracing::{debug, warn};

use super::payload;
use crate::router::Inbound;
use crate::NodeContext;

const METHOD_NOT_ALLOWED: u16 = 405;

pub async fn handle(ctx: &NodeContext, inbound: &Inbound) {
    let origin = inbound.origin();
    let envelope = &inbound.envelope;
    let action_type = envelope.action_type();
    let resource_type = envelope.resource_type();

    let reply = match action_type {
        ActionType::Query | ActionType::Aggregate | ActionType::Fetch => {
            match ctx.resources.fetch(resource_type, envelope.payload()).await {
                Ok(value) => envelope.reply(
                    MessageType::DataResponse,
                    action_type,
                    payload([(resource_type.payload_key(), value)]),
                    ctx.sender(),
                ),
                Err(err) => {
                    debug!(peer_id = %origin, %resource_type, %err, "Data request failed");
                    error_reply(ctx, envelope, err.status(), &err.to_string())
                }
            }
        }
        ActionType::Create | ActionType::Update | ActionType::Delete => error_reply(
            ctx,
            envelope,
            METHOD_NOT_ALLOWED,
            &format!("{action_type} is not accepted from peers"),
        ),
        ActionType::RequestPublicKey
        | ActionType::ResponsePublicKey
        | ActionType::Ping
        | ActionType::Pong => {
            warn!(peer_id = %origin, %action_type, "Unknown data action, ignoring");
            return;
        }
    };

    if let Err(err) = ctx.messenger.send(origin, &reply).await {
        warn!(peer_id = %origin, %err, "Failed to answer data request");
    }
}

fn error_reply(ctx: &NodeContext, request: &Envelope, status: u16, message: &str) -> Envelope {
    request.reply(
        MessageType::DataError,
        request.action_type(),
        payload([("error", Value::from(message)), ("status", Value::from(status))]),
        ctx.sender(),
    )
}
