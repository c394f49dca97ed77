//! Closed registries of message, action and resource types.
//!
//! Each registry is a plain enum whose wire form is its SCREAMING_SNAKE name. Families
//! group entries for readability only; membership checks always look at the flat set.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// The registry a type string was checked against.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum TypeKind {
    #[strum(serialize = "message type")]
    Message,
    #[strum(serialize = "action type")]
    Action,
    #[strum(serialize = "resource type")]
    Resource,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageFamily {
    Sync,
    Data,
    Peer,
    Messaging,
    Health,
    Action,
}

#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    SyncRequest,
    SyncResponse,
    SyncUpdate,
    DataRequest,
    DataResponse,
    DataError,
    PeerAnnounce,
    PeerDisconnect,
    PeerRequest,
    PeerResponse,
    Broadcast,
    DirectMessage,
    HealthCheck,
    HealthStatus,
    ActionTrigger,
    ActionEmit,
}

impl MessageType {
    #[must_use]
    pub const fn family(self) -> MessageFamily {
        match self {
            Self::SyncRequest | Self::SyncResponse | Self::SyncUpdate => MessageFamily::Sync,
            Self::DataRequest | Self::DataResponse | Self::DataError => MessageFamily::Data,
            Self::PeerAnnounce | Self::PeerDisconnect | Self::PeerRequest | Self::PeerResponse => {
                MessageFamily::Peer
            }
            Self::Broadcast | Self::DirectMessage => MessageFamily::Messaging,
            Self::HealthCheck | Self::HealthStatus => MessageFamily::Health,
            Self::ActionTrigger | Self::ActionEmit => MessageFamily::Action,
        }
    }

    /// Whether envelopes of this type answer an earlier request.
    #[must_use]
    pub const fn is_reply(self) -> bool {
        matches!(
            self,
            Self::SyncResponse
                | Self::DataResponse
                | Self::DataError
                | Self::PeerResponse
                | Self::HealthStatus
        )
    }

    #[must_use]
    pub fn is_known(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionFamily {
    Data,
    Resource,
    Peer,
    Health,
}

#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Query,
    Aggregate,
    Create,
    Fetch,
    Update,
    Delete,
    RequestPublicKey,
    ResponsePublicKey,
    Ping,
    Pong,
}

impl ActionType {
    #[must_use]
    pub const fn family(self) -> ActionFamily {
        match self {
            Self::Query | Self::Aggregate => ActionFamily::Data,
            Self::Create | Self::Fetch | Self::Update | Self::Delete => ActionFamily::Resource,
            Self::RequestPublicKey | Self::ResponsePublicKey => ActionFamily::Peer,
            Self::Ping | Self::Pong => ActionFamily::Health,
        }
    }

    /// Actions that only read remote state.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Query | Self::Aggregate | Self::Fetch)
    }

    #[must_use]
    pub fn is_known(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    SynapseMetadata,
    PeerPublicKey,
    User,
    AllUsers,
    Post,
    AllPosts,
    Comments,
    Conversation,
    Message,
    Notification,
    HealthStatus,
    Reactions,
    ChannelChats,
}

impl ResourceType {
    /// Name of the payload field that carries this resource in a response.
    #[must_use]
    pub const fn payload_key(self) -> &'static str {
        match self {
            Self::SynapseMetadata => "metadata",
            Self::PeerPublicKey => "publicKey",
            Self::User => "user",
            Self::AllUsers => "users",
            Self::Post => "post",
            Self::AllPosts => "posts",
            Self::Comments => "comments",
            Self::Conversation => "conversation",
            Self::Message => "message",
            Self::Notification => "notifications",
            Self::HealthStatus => "status",
            Self::Reactions => "reactions",
            Self::ChannelChats => "chats",
        }
    }

    #[must_use]
    pub fn is_known(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

/// Every wire name in a registry, in declaration order.
pub fn names<T>() -> impl Iterator<Item = &'static str>
where
    T: IntoEnumIterator + Into<&'static str>,
{
    T::iter().map(Into::into)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(MessageType::DataRequest.as_ref(), "DATA_REQUEST");
        assert_eq!(MessageType::HealthCheck.to_string(), "HEALTH_CHECK");
        assert_eq!(ActionType::RequestPublicKey.as_ref(), "REQUEST_PUBLIC_KEY");
        assert_eq!(ResourceType::ChannelChats.as_ref(), "CHANNEL_CHATS");

        assert_eq!(
            serde_json::to_string(&ResourceType::SynapseMetadata).unwrap(),
            "\"SYNAPSE_METADATA\""
        );
        assert_eq!(
            serde_json::from_str::<ActionType>("\"PONG\"").unwrap(),
            ActionType::Pong
        );
    }

    #[test]
    fn test_membership() {
        assert!(MessageType::is_known("PEER_REQUEST"));
        assert!(!MessageType::is_known("PEER_REQUEST_V2"));
        assert!(!MessageType::is_known("peer_request"));
        assert!(ActionType::is_known("PING"));
        assert!(!ActionType::is_known("PEER_REQUEST"));
        assert!(ResourceType::is_known("ALL_POSTS"));
        assert!(!ResourceType::is_known(""));
    }

    #[test]
    fn test_every_member_parses_back() {
        for name in names::<MessageType>() {
            assert!(MessageType::is_known(name), "{name} should be a message type");
        }
        for name in names::<ActionType>() {
            assert!(ActionType::is_known(name), "{name} should be an action type");
        }
        for name in names::<ResourceType>() {
            assert!(ResourceType::is_known(name), "{name} should be a resource type");
        }
    }

    #[test]
    fn test_payload_keys_are_distinct() {
        let keys: HashSet<_> = ResourceType::iter().map(ResourceType::payload_key).collect();
        assert_eq!(keys.len(), ResourceType::iter().count());
    }

    #[test]
    fn test_families() {
        assert_eq!(MessageType::PeerResponse.family(), MessageFamily::Peer);
        assert_eq!(MessageType::DirectMessage.family(), MessageFamily::Messaging);
        assert_eq!(ActionType::Fetch.family(), ActionFamily::Resource);
        assert!(MessageType::HealthStatus.is_reply());
        assert!(!MessageType::HealthCheck.is_reply());
        assert!(ActionType::Aggregate.is_read());
        assert!(!ActionType::Delete.is_read());
    }
}
