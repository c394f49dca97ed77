use thiserror::Error as ThisError;

use crate::types::TypeKind;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("invalid {kind} `{value}`")]
    InvalidType { kind: TypeKind, value: String },
    #[error("malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unsupported protocol `{0}`")]
    UnsupportedProtocol(String),
    #[error("unsupported protocol version `{0}`")]
    UnsupportedVersion(String),
}

impl ProtocolError {
    pub(crate) fn invalid(kind: TypeKind, value: impl Into<String>) -> Self {
        Self::InvalidType {
            kind,
            value: value.into(),
        }
    }
}
