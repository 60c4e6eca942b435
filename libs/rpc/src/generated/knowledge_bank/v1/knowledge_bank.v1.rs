// @generated
// This file is @generated by prost-build.
/// A single embedding stored in a knowledge bank.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmbeddingVector {
    /// The key this vector is stored under.
    #[prost(string, tag = "1")]
    pub tag: ::prost::alloc::string::String,
    #[prost(float, repeated, tag = "2")]
    pub value: ::prost::alloc::vec::Vec<f32>,
    /// Number of times the key was looked up with update = true.
    #[prost(float, tag = "3")]
    pub weight: f32,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ZeroInitializer {}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct RandomUniformInitializer {
    #[prost(float, tag = "1")]
    pub low: f32,
    #[prost(float, tag = "2")]
    pub high: f32,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct EmbeddingInitializer {
    #[prost(oneof = "embedding_initializer::Type", tags = "1, 2")]
    pub r#type: ::core::option::Option<embedding_initializer::Type>,
}
/// Nested message and enum types in `EmbeddingInitializer`.
pub mod embedding_initializer {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "1")]
        ZeroInitializer(super::ZeroInitializer),
        #[prost(message, tag = "2")]
        RandomUniformInitializer(super::RandomUniformInitializer),
    }
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct InProtoKnowledgeBankConfig {}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct KnowledgeBankConfig {
    #[prost(message, optional, tag = "1")]
    pub initializer: ::core::option::Option<EmbeddingInitializer>,
    /// Backend selector.
    #[prost(oneof = "knowledge_bank_config::Extension", tags = "2")]
    pub extension: ::core::option::Option<knowledge_bank_config::Extension>,
}
/// Nested message and enum types in `KnowledgeBankConfig`.
pub mod knowledge_bank_config {
    /// Backend selector.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Oneof)]
    pub enum Extension {
        #[prost(message, tag = "2")]
        InProto(super::InProtoKnowledgeBankConfig),
    }
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct SgdConfig {}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct AdagradConfig {
    #[prost(float, tag = "1")]
    pub init_accumulator_value: f32,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GradientDescentConfig {
    #[prost(float, tag = "1")]
    pub learning_rate: f32,
    #[prost(oneof = "gradient_descent_config::Optimizer", tags = "2, 3")]
    pub optimizer: ::core::option::Option<gradient_descent_config::Optimizer>,
}
/// Nested message and enum types in `GradientDescentConfig`.
pub mod gradient_descent_config {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Optimizer {
        #[prost(message, tag = "2")]
        Sgd(super::SgdConfig),
        #[prost(message, tag = "3")]
        Adagrad(super::AdagradConfig),
    }
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct DynamicEmbeddingConfig {
    #[prost(int32, tag = "1")]
    pub embedding_dimension: i32,
    #[prost(message, optional, tag = "2")]
    pub knowledge_bank_config: ::core::option::Option<KnowledgeBankConfig>,
    #[prost(message, optional, tag = "3")]
    pub gradient_descent_config: ::core::option::Option<GradientDescentConfig>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartSessionRequest {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub config: ::core::option::Option<DynamicEmbeddingConfig>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct StartSessionResponse {
    /// Serialized StartSessionRequest.
    #[prost(bytes = "vec", tag = "1")]
    pub session_handle: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct LookupRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub session_handle: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, repeated, tag = "2")]
    pub key: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(bool, tag = "3")]
    pub update: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LookupResponse {
    #[prost(map = "string, message", tag = "1")]
    pub embedding_table: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        EmbeddingVector,
    >,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub session_handle: ::prost::alloc::vec::Vec<u8>,
    #[prost(map = "string, message", tag = "2")]
    pub values: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        EmbeddingVector,
    >,
    #[prost(map = "string, message", tag = "3")]
    pub gradients: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        EmbeddingVector,
    >,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct UpdateResponse {}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ExportRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub session_handle: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "2")]
    pub export_directory: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ExportResponse {
    #[prost(string, tag = "1")]
    pub knowledge_bank_saved_path: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ImportRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub session_handle: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "2")]
    pub knowledge_bank_saved_path: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ImportResponse {}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct KnowledgeBankSizeRequest {}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct KnowledgeBankSizeResponse {
    #[prost(uint64, tag = "1")]
    pub size: u64,
}
include!("knowledge_bank.v1.tonic.rs");
// @@protoc_insertion_point(module)
