use grpc_client::GrpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeBankError {
    /// Malformed caller input. The message is shown to the caller verbatim.
    #[error("{0}")]
    InvalidArgument(String),

    /// Backend failure or a broken store contract.
    #[error("{0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC failed: {}", .0.message())]
    Rpc(tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] GrpcError),
}

pub type KnowledgeBankResult<T> = Result<T, KnowledgeBankError>;

impl KnowledgeBankError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        KnowledgeBankError::InvalidArgument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        KnowledgeBankError::Internal(msg.into())
    }
}

impl From<prost::DecodeError> for KnowledgeBankError {
    fn from(err: prost::DecodeError) -> Self {
        KnowledgeBankError::Internal(format!("Protobuf decode error: {}", err))
    }
}

impl From<serde_json::Error> for KnowledgeBankError {
    fn from(err: serde_json::Error) -> Self {
        KnowledgeBankError::Internal(format!("JSON error: {}", err))
    }
}

impl From<core_config::ConfigError> for KnowledgeBankError {
    fn from(err: core_config::ConfigError) -> Self {
        KnowledgeBankError::Config(err.to_string())
    }
}

impl From<tonic::Status> for KnowledgeBankError {
    fn from(status: tonic::Status) -> Self {
        KnowledgeBankError::Rpc(status)
    }
}

impl From<KnowledgeBankError> for tonic::Status {
    fn from(err: KnowledgeBankError) -> Self {
        match err {
            KnowledgeBankError::InvalidArgument(msg) => tonic::Status::invalid_argument(msg),
            KnowledgeBankError::Internal(msg) => tonic::Status::internal(msg),
            KnowledgeBankError::Config(msg) => {
                tonic::Status::invalid_argument(format!("Config error: {}", msg))
            }
            KnowledgeBankError::Io(e) => tonic::Status::internal(format!("I/O error: {}", e)),
            KnowledgeBankError::Rpc(status) => status,
            KnowledgeBankError::Transport(e) => e.into(),
        }
    }
}
