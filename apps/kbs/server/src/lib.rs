//! Knowledge Bank gRPC Service
//!
//! Serves `knowledge_bank.v1.KnowledgeBankService`: one process-wide session
//! registry, each session backed by an in-memory embedding store and an
//! optional gradient descent optimizer.
//!
//! ## Architecture
//!
//! ```text
//! BatchManager (client)
//!   ↓ (gRPC with Zstd compression)
//! KnowledgeBankServiceImpl
//!   ↓
//! SessionRegistry
//!   ↓
//! ┌──────────────────────┬──────────────────────────┐
//! │ InProtoKnowledgeBank │ GradientDescentOptimizer │
//! └──────────────────────┴──────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `server`: Server initialization and lifecycle

pub mod server;

pub use server::{knowledge_bank_service, run};
