//! The protocol envelope and its codec.
//!
//! Decoding happens in two steps. [`decode`] is purely structural and yields a
//! [`RawEnvelope`] whose type fields are still strings; [`RawEnvelope::validate`] then
//! checks protocol, version and registry membership and produces a typed [`Envelope`].
//! Only typed envelopes reach the dispatch layer.

use core::str::FromStr;

use chrono::Utc;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::types::{ActionType, MessageType, ResourceType, TypeKind};

pub const PROTOCOL: &str = "synapse";
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Frame terminator on the wire.
pub const DELIMITER: u8 = b'\n';

pub type Payload = Map<String, Value>;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub request_id: String,
    pub sender: String,
    pub timestamp: i64,
}

impl Meta {
    /// Fresh metadata with a new request id and the current time.
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        MetaFields {
            sender: sender.into(),
            ..MetaFields::default()
        }
        .complete()
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Metadata as supplied by a caller or read off the wire, before defaults are filled.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFields {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl MetaFields {
    #[must_use]
    pub fn complete(self) -> Meta {
        Meta {
            request_id: self
                .request_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_request_id),
            sender: self.sender,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
        }
    }
}

impl From<Meta> for MetaFields {
    fn from(meta: Meta) -> Self {
        Self {
            request_id: Some(meta.request_id),
            sender: meta.sender,
            timestamp: Some(meta.timestamp),
        }
    }
}

#[must_use]
pub fn generate_request_id() -> String {
    hex::encode(thread_rng().gen::<[u8; 16]>())
}

#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A validated protocol message. Envelopes are never mutated; replies are new envelopes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    protocol: String,
    version: String,
    message_type: MessageType,
    action_type: ActionType,
    resource_type: ResourceType,
    payload: Payload,
    meta: Meta,
}

impl Envelope {
    #[must_use]
    pub fn new(
        message_type: MessageType,
        action_type: ActionType,
        resource_type: ResourceType,
        payload: Payload,
        meta: Meta,
    ) -> Self {
        Self {
            protocol: PROTOCOL.to_owned(),
            version: PROTOCOL_VERSION.to_owned(),
            message_type,
            action_type,
            resource_type,
            payload,
            meta,
        }
    }

    /// Builds an envelope from untyped names, rejecting anything outside the registries.
    pub fn create(
        message_type: &str,
        action_type: &str,
        resource_type: &str,
        payload: Payload,
        meta: impl Into<MetaFields>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(
            parse_type(TypeKind::Message, message_type)?,
            parse_type(TypeKind::Action, action_type)?,
            parse_type(TypeKind::Resource, resource_type)?,
            payload,
            meta.into().complete(),
        ))
    }

    /// Decodes and validates a single frame.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        decode(bytes)?.validate()
    }

    /// A new envelope answering this one: same request id and resource type, fresh timestamp.
    #[must_use]
    pub fn reply(
        &self,
        message_type: MessageType,
        action_type: ActionType,
        payload: Payload,
        sender: impl Into<String>,
    ) -> Self {
        Self::new(
            message_type,
            action_type,
            self.resource_type,
            payload,
            Meta::new(sender).with_request_id(self.meta.request_id.clone()),
        )
    }

    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    #[must_use]
    pub const fn meta(&self) -> &Meta {
        &self.meta
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.meta.request_id
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        &self.meta.sender
    }

    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// An envelope that parsed structurally but has not been checked against the registries.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvelope {
    pub protocol: String,
    pub version: String,
    pub message_type: String,
    pub action_type: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    pub payload: Payload,
    pub meta: MetaFields,
}

impl RawEnvelope {
    pub fn validate(self) -> Result<Envelope, ProtocolError> {
        if self.protocol != PROTOCOL {
            return Err(ProtocolError::UnsupportedProtocol(self.protocol));
        }

        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }

        let message_type = parse_type(TypeKind::Message, &self.message_type)?;
        let action_type = parse_type(TypeKind::Action, &self.action_type)?;
        let resource_type = match self.resource_type {
            Some(value) => parse_type(TypeKind::Resource, &value)?,
            None => return Err(ProtocolError::invalid(TypeKind::Resource, "")),
        };

        Ok(Envelope {
            protocol: self.protocol,
            version: self.version,
            message_type,
            action_type,
            resource_type,
            payload: self.payload,
            meta: self.meta.complete(),
        })
    }
}

fn parse_type<T: FromStr>(kind: TypeKind, value: &str) -> Result<T, ProtocolError> {
    value
        .parse()
        .map_err(|_| ProtocolError::invalid(kind, value))
}

/// Serializes an envelope as a single newline-terminated JSON record.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(envelope).map_err(ProtocolError::Encode)?;
    bytes.push(DELIMITER);
    Ok(bytes)
}

/// Parses one record, with or without its trailing delimiter.
pub fn decode(bytes: &[u8]) -> Result<RawEnvelope, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn sample() -> Envelope {
        Envelope::new(
            MessageType::DataRequest,
            ActionType::Query,
            ResourceType::Post,
            payload(json!({ "postId": "p-1", "nested": { "depth": [1, 2, 3] } })),
            Meta::new("12D3KooWSender"),
        )
    }

    #[test]
    fn test_round_trip() {
        let envelope = sample();
        let bytes = encode(&envelope).unwrap();

        assert_eq!(bytes.last(), Some(&DELIMITER));
        assert_eq!(
            bytes.iter().filter(|b| **b == DELIMITER).count(),
            1,
            "exactly one record delimiter"
        );

        let decoded = decode(&bytes).unwrap().validate().unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_wire_shape() {
        let envelope = sample();
        let value: Value = serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();

        assert_eq!(value["protocol"], PROTOCOL);
        assert_eq!(value["version"], PROTOCOL_VERSION);
        assert_eq!(value["messageType"], "DATA_REQUEST");
        assert_eq!(value["actionType"], "QUERY");
        assert_eq!(value["resourceType"], "POST");
        assert_eq!(value["payload"]["postId"], "p-1");
        assert_eq!(value["meta"]["requestId"], envelope.request_id());
        assert_eq!(value["meta"]["sender"], "12D3KooWSender");
        assert!(value["meta"]["timestamp"].is_i64());
    }

    #[test]
    fn test_create_rejects_unknown_types() {
        let err = Envelope::create("DATA_BURST", "QUERY", "POST", Payload::new(), Meta::new("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidType {
                kind: TypeKind::Message,
                ..
            }
        ));

        let err = Envelope::create("DATA_REQUEST", "EXPLODE", "POST", Payload::new(), Meta::new("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidType {
                kind: TypeKind::Action,
                ..
            }
        ));

        let err = Envelope::create("DATA_REQUEST", "QUERY", "POSTS", Payload::new(), Meta::new("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidType {
                kind: TypeKind::Resource,
                ..
            }
        ));
    }

    #[test]
    fn test_create_fills_meta() {
        let first = Envelope::create(
            "HEALTH_CHECK",
            "PING",
            "HEALTH_STATUS",
            Payload::new(),
            MetaFields {
                sender: "peer-a".to_owned(),
                ..MetaFields::default()
            },
        )
        .unwrap();
        let second = Envelope::create(
            "HEALTH_CHECK",
            "PING",
            "HEALTH_STATUS",
            Payload::new(),
            MetaFields {
                sender: "peer-a".to_owned(),
                ..MetaFields::default()
            },
        )
        .unwrap();

        assert_eq!(first.request_id().len(), 32);
        assert_ne!(first.request_id(), second.request_id());
        assert!(first.meta().timestamp > 0);

        let supplied = Envelope::create(
            "HEALTH_CHECK",
            "PING",
            "HEALTH_STATUS",
            Payload::new(),
            MetaFields {
                request_id: Some("fixed".to_owned()),
                sender: "peer-a".to_owned(),
                timestamp: Some(42),
            },
        )
        .unwrap();
        assert_eq!(supplied.request_id(), "fixed");
        assert_eq!(supplied.meta().timestamp, 42);
    }

    #[test]
    fn test_decode_is_structural() {
        let missing_payload = br#"{"protocol":"synapse","version":"1.0.0","messageType":"DATA_REQUEST","actionType":"QUERY","meta":{"requestId":"r","sender":"s","timestamp":1}}"#;
        assert!(matches!(
            decode(missing_payload),
            Err(ProtocolError::Decode(_))
        ));

        let payload_not_object = br#"{"protocol":"synapse","version":"1.0.0","messageType":"DATA_REQUEST","actionType":"QUERY","payload":[],"meta":{}}"#;
        assert!(matches!(
            decode(payload_not_object),
            Err(ProtocolError::Decode(_))
        ));

        assert!(matches!(decode(b"not json\n"), Err(ProtocolError::Decode(_))));

        // Unknown types still decode; rejecting them is validation's job.
        let unknown = br#"{"protocol":"synapse","version":"1.0.0","messageType":"TELEPORT","actionType":"QUERY","resourceType":"POST","payload":{},"meta":{"sender":"s"}}"#;
        let raw = decode(unknown).unwrap();
        assert_eq!(raw.message_type, "TELEPORT");
        assert!(matches!(
            raw.validate(),
            Err(ProtocolError::InvalidType {
                kind: TypeKind::Message,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_protocol_and_version() {
        let mut raw = decode(&encode(&sample()).unwrap()).unwrap();
        raw.protocol = "other".to_owned();
        assert!(matches!(
            raw.clone().validate(),
            Err(ProtocolError::UnsupportedProtocol(protocol)) if protocol == "other"
        ));

        raw.protocol = PROTOCOL.to_owned();
        raw.version = "2.0.0".to_owned();
        assert!(matches!(
            raw.clone().validate(),
            Err(ProtocolError::UnsupportedVersion(version)) if version == "2.0.0"
        ));

        raw.version = PROTOCOL_VERSION.to_owned();
        raw.resource_type = None;
        assert!(matches!(
            raw.validate(),
            Err(ProtocolError::InvalidType {
                kind: TypeKind::Resource,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_fills_missing_request_id() {
        let frame = br#"{"protocol":"synapse","version":"1.0.0","messageType":"HEALTH_CHECK","actionType":"PING","resourceType":"HEALTH_STATUS","payload":{},"meta":{"sender":"s"}}"#;
        let envelope = Envelope::from_slice(frame).unwrap();

        assert!(!envelope.request_id().is_empty());
        assert_eq!(envelope.sender(), "s");
    }

    #[test]
    fn test_reply_keeps_correlation() {
        let request = sample();
        let reply = request.reply(
            MessageType::DataResponse,
            ActionType::Query,
            payload(json!({ "post": { "id": "p-1" } })),
            "12D3KooWReplier",
        );

        assert_eq!(reply.request_id(), request.request_id());
        assert_eq!(reply.resource_type(), ResourceType::Post);
        assert_eq!(reply.sender(), "12D3KooWReplier");
        assert_eq!(reply.message_type(), MessageType::DataResponse);
        assert_eq!(request.message_type(), MessageType::DataRequest);
    }
}
