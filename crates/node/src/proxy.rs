//! Remote Resource Proxy.
//!
//! Each `fetch_remote_*` call validates its parameters, resolves the target Synapse by its
//! public key, sends one correlated request and unwraps the resource from the reply. Failures
//! are returned to the caller as they happen; nothing is retried here.

use core::time::Duration;

use libp2p::PeerId;
use serde_json::Value;
use synapse_network_primitives::envelope::{Envelope, Meta, Payload};
use synapse_network_primitives::types::{ActionType, MessageType, ResourceType};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::messenger::MessengerError;
use crate::NodeContext;

/// Query parameter naming the target Synapse.
pub const SYNAPSE_PUBLIC_KEY: &str = "synapsePublicKey";

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("no synapse known with public key `{0}`")]
    PeerNotFound(String),
    #[error("remote synapse did not answer within {0:?}")]
    Timeout(Duration),
    #[error("failed to reach remote synapse: {0}")]
    Transport(String),
    #[error("remote synapse returned an error: {message}")]
    Remote { status: u16, message: String },
    #[error("remote reply is missing `{0}`")]
    MissingField(&'static str),
}

impl ProxyError {
    /// The HTTP status this error maps to at the API boundary.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::MissingParameter(_) => 400,
            Self::PeerNotFound(_) => 404,
            Self::Timeout(_) => 504,
            Self::Remote { status, .. } => match *status {
                400..=599 => *status,
                _ => 502,
            },
            Self::Transport(_) | Self::MissingField(_) => 502,
        }
    }
}

impl From<MessengerError> for ProxyError {
    fn from(err: MessengerError) -> Self {
        match err {
            MessengerError::RequestTimeout { timeout, .. } => Self::Timeout(timeout),
            err => Self::Transport(err.to_string()),
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ProxyError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ProxyError::MissingParameter(name))
}

fn params(key: &str, value: &str) -> Payload {
    let mut payload = Payload::new();
    drop(payload.insert(key.to_owned(), Value::from(value)));
    payload
}

#[derive(Clone, Debug)]
pub struct RemoteResources {
    ctx: NodeContext,
}

impl RemoteResources {
    #[must_use]
    pub const fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    /// Maps a Synapse public key to the peer currently known to hold it.
    pub fn resolve(&self, public_key: Option<&str>) -> Result<PeerId, ProxyError> {
        let public_key = required(public_key, SYNAPSE_PUBLIC_KEY)?;

        self.ctx
            .registry
            .get_peer_by_public_key(public_key)
            .ok_or_else(|| ProxyError::PeerNotFound(public_key.to_owned()))
    }

    /// Sends one request to the Synapse holding `public_key` and waits for its reply.
    ///
    /// A `DATA_ERROR` reply is turned into [`ProxyError::Remote`].
    pub async fn request(
        &self,
        public_key: Option<&str>,
        message_type: MessageType,
        action_type: ActionType,
        resource_type: ResourceType,
        params: Payload,
    ) -> Result<Envelope, ProxyError> {
        let peer_id = self.resolve(public_key)?;

        let request = Envelope::new(
            message_type,
            action_type,
            resource_type,
            params,
            Meta::new(self.ctx.sender()),
        );

        debug!(
            %peer_id,
            request_id = request.request_id(),
            %resource_type,
            "Forwarding request to remote synapse"
        );

        let reply = self
            .ctx
            .messenger
            .send_with_response(peer_id, &request, self.ctx.request_timeout)
            .await?;

        if reply.message_type() == MessageType::DataError {
            let status = reply
                .payload()
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok())
                .unwrap_or(502);
            let message = reply
                .payload_str("error")
                .unwrap_or("remote synapse error")
                .to_owned();

            return Err(ProxyError::Remote { status, message });
        }

        Ok(reply)
    }

    /// Requests `resource_type` and returns the payload field that carries it.
    pub async fn fetch(
        &self,
        public_key: Option<&str>,
        action_type: ActionType,
        resource_type: ResourceType,
        params: Payload,
    ) -> Result<Value, ProxyError> {
        let reply = self
            .request(
                public_key,
                MessageType::DataRequest,
                action_type,
                resource_type,
                params,
            )
            .await?;

        let key = resource_type.payload_key();

        reply
            .into_payload()
            .remove(key)
            .ok_or(ProxyError::MissingField(key))
    }

    pub async fn fetch_remote_user(
        &self,
        public_key: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let user_id = required(user_id, "userId")?;
        self.fetch(
            public_key,
            ActionType::Fetch,
            ResourceType::User,
            params("userId", user_id),
        )
        .await
    }

    pub async fn fetch_remote_users(&self, public_key: Option<&str>) -> Result<Value, ProxyError> {
        self.fetch(
            public_key,
            ActionType::Query,
            ResourceType::AllUsers,
            Payload::new(),
        )
        .await
    }

    pub async fn fetch_remote_post(
        &self,
        public_key: Option<&str>,
        post_id: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let post_id = required(post_id, "postId")?;
        self.fetch(
            public_key,
            ActionType::Fetch,
            ResourceType::Post,
            params("postId", post_id),
        )
        .await
    }

    pub async fn fetch_remote_posts(&self, public_key: Option<&str>) -> Result<Value, ProxyError> {
        self.fetch(
            public_key,
            ActionType::Query,
            ResourceType::AllPosts,
            Payload::new(),
        )
        .await
    }

    pub async fn fetch_remote_comments(
        &self,
        public_key: Option<&str>,
        post_id: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let post_id = required(post_id, "postId")?;
        self.fetch(
            public_key,
            ActionType::Query,
            ResourceType::Comments,
            params("postId", post_id),
        )
        .await
    }

    pub async fn fetch_remote_reactions(
        &self,
        public_key: Option<&str>,
        post_id: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let post_id = required(post_id, "postId")?;
        self.fetch(
            public_key,
            ActionType::Query,
            ResourceType::Reactions,
            params("postId", post_id),
        )
        .await
    }

    pub async fn fetch_remote_channel_chats(
        &self,
        public_key: Option<&str>,
        channel_id: Option<&str>,
    ) -> Result<Value, ProxyError> {
        let channel_id = required(channel_id, "channelId")?;
        self.fetch(
            public_key,
            ActionType::Query,
            ResourceType::ChannelChats,
            params("channelId", channel_id),
        )
        .await
    }

    pub async fn fetch_remote_metadata(
        &self,
        public_key: Option<&str>,
    ) -> Result<Value, ProxyError> {
        self.fetch(
            public_key,
            ActionType::Fetch,
            ResourceType::SynapseMetadata,
            Payload::new(),
        )
        .await
    }

    /// Round-trips a `PING` and returns the remote `PONG` payload.
    pub async fn ping_remote(&self, public_key: Option<&str>) -> Result<Value, ProxyError> {
        let reply = self
            .request(
                public_key,
                MessageType::HealthCheck,
                ActionType::Ping,
                ResourceType::HealthStatus,
                Payload::new(),
            )
            .await?;

        if reply.action_type() != ActionType::Pong {
            return Err(ProxyError::Transport(format!(
                "expected PONG, got {}",
                reply.action_type()
            )));
        }

        Ok(Value::Object(reply.into_payload()))
    }
}
