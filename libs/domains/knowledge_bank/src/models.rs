use prost::Message;
use rpc::knowledge_bank::StartSessionRequest;
use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeBankError, KnowledgeBankResult};

pub use rpc::knowledge_bank::EmbeddingVector;

/// Default Adagrad accumulator seed when the config leaves it unset.
pub const DEFAULT_ADAGRAD_INIT_ACCUMULATOR: f32 = 0.1;

/// Opaque session identifier: the protobuf encoding of the `StartSessionRequest`
/// that created the session.
///
/// prost encodes fields in tag order and the request has no map fields, so the
/// same (name, config) pair always yields the same bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(Vec<u8>);

impl SessionHandle {
    pub fn from_request(request: &StartSessionRequest) -> Self {
        Self(request.encode_to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the handle back into the request it was built from.
    pub fn decode(&self) -> KnowledgeBankResult<StartSessionRequest> {
        StartSessionRequest::decode(self.0.as_slice())
            .map_err(|_| KnowledgeBankError::invalid_argument("session_handle cannot be parsed."))
    }
}

/// Validated form of `DynamicEmbeddingConfig`.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    pub knowledge_bank: KnowledgeBankConfig,
    pub gradient_descent: Option<GradientDescentConfig>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeBankConfig {
    pub initializer: InitializerConfig,
    pub backend: StorageBackend,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitializerConfig {
    #[default]
    Zero,
    RandomUniform { low: f32, high: f32 },
}

/// Closed set of embedding store backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    InProto,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientDescentConfig {
    pub learning_rate: f32,
    pub rule: OptimizerRule,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptimizerRule {
    Sgd,
    Adagrad { init_accumulator_value: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc::knowledge_bank::DynamicEmbeddingConfig;

    fn request(name: &str, dim: i32) -> StartSessionRequest {
        StartSessionRequest {
            name: name.to_string(),
            config: Some(DynamicEmbeddingConfig {
                embedding_dimension: dim,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_handle_is_deterministic() {
        let a = SessionHandle::from_request(&request("emb", 2));
        let b = SessionHandle::from_request(&request("emb", 2));
        assert_eq!(a, b);
        assert_ne!(a, SessionHandle::from_request(&request("emb", 3)));
        assert_ne!(a, SessionHandle::from_request(&request("other", 2)));
    }

    #[test]
    fn test_handle_decodes_to_request() {
        let req = request("emb", 4);
        let handle = SessionHandle::from_request(&req);
        assert_eq!(handle.decode().unwrap(), req);
    }

    #[test]
    fn test_garbage_handle_fails_to_parse() {
        let err = SessionHandle::from_bytes(vec![0xff]).decode().unwrap_err();
        assert!(matches!(err, KnowledgeBankError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "session_handle cannot be parsed.");
    }
}
