//! Knowledge Bank Domain Library
//!
//! An online, mutable key → embedding store served over gRPC. Each session owns
//! one embedding store and, when configured, one gradient descent optimizer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐    gRPC    ┌──────────────────────────┐
//! │   BatchManager   │ ─────────► │ KnowledgeBankServiceImpl │
//! │ (tensor batches) │            └────────────┬─────────────┘
//! └──────────────────┘                         │
//!                                  ┌───────────▼───────────┐
//!                                  │    SessionRegistry    │
//!                                  └─────┬───────────┬─────┘
//!                                        │           │
//!                          ┌─────────────▼───┐  ┌────▼─────────────────────┐
//!                          │ KnowledgeBank   │  │ GradientDescentOptimizer │
//!                          │ (trait)         │  │ (SGD / Adagrad)          │
//!                          └─────────┬───────┘  └──────────────────────────┘
//!                          ┌─────────▼───────────┐
//!                          │ InProtoKnowledgeBank│
//!                          └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_knowledge_bank::{BatchManager, Tensor};
//! use rpc::knowledge_bank::DynamicEmbeddingConfig;
//!
//! # async fn example(config: DynamicEmbeddingConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BatchManager::create(config, "emb", "localhost:50051")
//!     .await
//!     .ok_or("knowledge bank unavailable")?;
//!
//! let keys = Tensor::matrix(2, 2, vec!["a".into(), "b".into(), "c".into(), String::new()])?;
//! let embeddings = manager.lookup(&keys, true).await?;
//! assert_eq!(embeddings.shape(), &[2, 2, manager.embedding_dimension()]);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod conversions;
pub mod error;
pub mod knowledge_bank;
pub mod manager;
pub mod models;
pub mod optimizer;
pub mod registry;
pub mod service;
mod snapshot;

pub use batch::Tensor;
pub use config::ManagerOptions;
pub use error::{KnowledgeBankError, KnowledgeBankResult};
pub use knowledge_bank::{InProtoKnowledgeBank, KnowledgeBank, create_knowledge_bank};
pub use manager::BatchManager;
pub use models::{
    EmbeddingConfig, GradientDescentConfig, InitializerConfig, KnowledgeBankConfig,
    OptimizerRule, SessionHandle, StorageBackend,
};
pub use optimizer::GradientDescentOptimizer;
pub use registry::SessionRegistry;
pub use service::KnowledgeBankServiceImpl;
