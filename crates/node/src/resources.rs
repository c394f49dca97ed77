//! The boundary to the application data a Synapse serves to its peers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use camino::Utf8Path;
use eyre::{Result as EyreResult, WrapErr};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use synapse_network_primitives::envelope::Payload;
use synapse_network_primitives::types::ResourceType;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("{resource} `{id}` not found")]
    NotFound { resource: ResourceType, id: String },
    #[error("{0} is not served by this synapse")]
    Unsupported(ResourceType),
    #[error("missing or invalid parameter `{0}`")]
    InvalidParameter(&'static str),
}

impl ResourceError {
    /// HTTP-equivalent status carried in `DATA_ERROR` replies.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Unsupported(_) => 501,
            Self::InvalidParameter(_) => 400,
        }
    }
}

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Looks up `resource_type` using the identifiers carried in a request payload.
    async fn fetch(&self, resource_type: ResourceType, params: &Payload)
        -> Result<Value, ResourceError>;
}

/// The identifier field each keyed or filtered lookup reads from the request payload.
#[must_use]
pub const fn id_param(resource_type: ResourceType) -> Option<&'static str> {
    match resource_type {
        ResourceType::User | ResourceType::Notification => Some("userId"),
        ResourceType::Post | ResourceType::Comments | ResourceType::Reactions => Some("postId"),
        ResourceType::ChannelChats => Some("channelId"),
        ResourceType::Conversation => Some("conversationId"),
        ResourceType::Message => Some("messageId"),
        ResourceType::SynapseMetadata
        | ResourceType::PeerPublicKey
        | ResourceType::AllUsers
        | ResourceType::AllPosts
        | ResourceType::HealthStatus => None,
    }
}

/// Seed document layout: one array per collection, every document carrying an `id`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seed {
    pub metadata: Option<Value>,
    pub users: Vec<Value>,
    pub posts: Vec<Value>,
    pub comments: Vec<Value>,
    pub reactions: Vec<Value>,
    pub chats: Vec<Value>,
    pub conversations: Vec<Value>,
    pub messages: Vec<Value>,
    pub notifications: Vec<Value>,
}

type Collection = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct Documents {
    metadata: Option<Value>,
    collections: BTreeMap<ResourceType, Collection>,
}

/// Serves documents from memory, optionally seeded from a JSON file.
#[derive(Debug, Default)]
pub struct InMemoryResources {
    documents: RwLock<Documents>,
}

impl InMemoryResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_seed(seed: Seed) -> Self {
        let resources = Self::new();

        if let Some(metadata) = seed.metadata {
            resources.set_metadata(metadata);
        }

        let collections = [
            (ResourceType::User, seed.users),
            (ResourceType::Post, seed.posts),
            (ResourceType::Comments, seed.comments),
            (ResourceType::Reactions, seed.reactions),
            (ResourceType::ChannelChats, seed.chats),
            (ResourceType::Conversation, seed.conversations),
            (ResourceType::Message, seed.messages),
            (ResourceType::Notification, seed.notifications),
        ];

        for (resource_type, documents) in collections {
            for document in documents {
                let Some(id) = document.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let id = id.to_owned();
                resources.insert(resource_type, id, document);
            }
        }

        resources
    }

    pub fn load(path: &Utf8Path) -> EyreResult<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read resource seed {path:?}"))?;

        let seed: Seed = serde_json::from_str(&content)
            .wrap_err_with(|| format!("failed to parse resource seed {path:?}"))?;

        Ok(Self::from_seed(seed))
    }

    pub fn insert(&self, resource_type: ResourceType, id: impl Into<String>, document: Value) {
        drop(
            self.documents
                .write()
                .collections
                .entry(resource_type)
                .or_default()
                .insert(id.into(), document),
        );
    }

    pub fn set_metadata(&self, metadata: Value) {
        self.documents.write().metadata = Some(metadata);
    }

    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.documents.read().metadata.is_some()
    }

    fn get(&self, resource_type: ResourceType, id: &str) -> Result<Value, ResourceError> {
        self.documents
            .read()
            .collections
            .get(&resource_type)
            .and_then(|collection| collection.get(id))
            .cloned()
            .ok_or_else(|| ResourceError::NotFound {
                resource: resource_type,
                id: id.to_owned(),
            })
    }

    fn all(&self, resource_type: ResourceType) -> Value {
        self.documents
            .read()
            .collections
            .get(&resource_type)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_else(|| Value::Array(vec![]))
    }

    fn filtered(&self, resource_type: ResourceType, field: &str, value: &str) -> Value {
        self.documents
            .read()
            .collections
            .get(&resource_type)
            .map(|collection| {
                collection
                    .values()
                    .filter(|document| document.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_else(|| Value::Array(vec![]))
    }
}

fn required<'a>(params: &'a Payload, key: &'static str) -> Result<&'a str, ResourceError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(ResourceError::InvalidParameter(key))
}

#[async_trait]
impl ResourceProvider for InMemoryResources {
    async fn fetch(
        &self,
        resource_type: ResourceType,
        params: &Payload,
    ) -> Result<Value, ResourceError> {
        match resource_type {
            ResourceType::SynapseMetadata => {
                self.documents
                    .read()
                    .metadata
                    .clone()
                    .ok_or_else(|| ResourceError::NotFound {
                        resource: resource_type,
                        id: "metadata".to_owned(),
                    })
            }
            ResourceType::AllUsers => Ok(self.all(ResourceType::User)),
            ResourceType::AllPosts => Ok(self.all(ResourceType::Post)),
            ResourceType::User
            | ResourceType::Post
            | ResourceType::Conversation
            | ResourceType::Message => {
                let Some(key) = id_param(resource_type) else {
                    return Err(ResourceError::Unsupported(resource_type));
                };
                self.get(resource_type, required(params, key)?)
            }
            ResourceType::Comments
            | ResourceType::Reactions
            | ResourceType::ChannelChats
            | ResourceType::Notification => {
                let Some(key) = id_param(resource_type) else {
                    return Err(ResourceError::Unsupported(resource_type));
                };
                Ok(self.filtered(resource_type, key, required(params, key)?))
            }
            ResourceType::PeerPublicKey | ResourceType::HealthStatus => {
                Err(ResourceError::Unsupported(resource_type))
            }
        }
    }
}
