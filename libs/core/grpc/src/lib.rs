//! # gRPC Client Library
//!
//! Channel creation, request-id propagation and server bootstrap helpers shared
//! by the knowledge bank server and its batch client.
//!
//! ## Quick Start
//!
//! ```ignore
//! use grpc_client::{ChannelConfig, TracingInterceptor, create_channel_with_config, normalize_address};
//! use rpc::knowledge_bank::knowledge_bank_service_client::KnowledgeBankServiceClient;
//! use std::time::Duration;
//!
//! let config = ChannelConfig::default().with_connect_timeout(Duration::from_secs(2));
//! let channel = create_channel_with_config(normalize_address("localhost:10000"), config).await?;
//! let client = KnowledgeBankServiceClient::with_interceptor(channel, TracingInterceptor::new())
//!     .accept_compressed(tonic::codec::CompressionEncoding::Zstd)
//!     .send_compressed(tonic::codec::CompressionEncoding::Zstd);
//! ```

pub mod channel;
pub mod error;
pub mod interceptors;
pub mod server;

pub use channel::{ChannelConfig, create_channel, create_channel_with_config, normalize_address};
pub use error::{GrpcError, GrpcResult};
pub use interceptors::{REQUEST_ID_HEADER, TracingInterceptor, request_id};
