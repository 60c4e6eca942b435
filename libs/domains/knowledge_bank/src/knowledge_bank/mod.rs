//! Embedding store abstraction and its backends.

mod in_proto;
mod initializer;

pub use in_proto::InProtoKnowledgeBank;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KnowledgeBankResult;
use crate::models::{EmbeddingVector, KnowledgeBankConfig, StorageBackend};

/// A per-session key → embedding container.
///
/// Batch methods return one result per input key, in input order. Per-key
/// failures are values; the batch call itself never fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeBank: Send + Sync {
    fn embedding_dimension(&self) -> usize;

    /// Pure read.
    async fn batch_lookup(&self, keys: &[String]) -> Vec<KnowledgeBankResult<EmbeddingVector>>;

    /// Read that creates missing keys from the initializer and bumps weights.
    async fn batch_lookup_with_update(
        &self,
        keys: &[String],
    ) -> Vec<KnowledgeBankResult<EmbeddingVector>>;

    /// Unconditional overwrite of each `(keys[i], values[i])` pair.
    async fn batch_update(
        &self,
        keys: &[String],
        values: &[EmbeddingVector],
    ) -> Vec<KnowledgeBankResult<()>>;

    async fn size(&self) -> usize;

    /// All stored keys in ascending order.
    async fn keys(&self) -> Vec<String>;

    /// Serializes the store into `directory` and returns the meta-data path.
    async fn export(&self, directory: &Path) -> KnowledgeBankResult<PathBuf>;

    /// Replaces the whole store with the snapshot behind `meta_data_path`.
    async fn import(&self, meta_data_path: &Path) -> KnowledgeBankResult<()>;
}

/// Builds the backend selected by `config.backend`.
pub fn create_knowledge_bank(
    dimension: usize,
    config: &KnowledgeBankConfig,
) -> Arc<dyn KnowledgeBank> {
    match config.backend {
        StorageBackend::InProto => Arc::new(InProtoKnowledgeBank::new(dimension, config.initializer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InitializerConfig;

    #[tokio::test]
    async fn test_factory_builds_in_proto_backend() {
        let config = KnowledgeBankConfig {
            initializer: InitializerConfig::Zero,
            backend: StorageBackend::InProto,
        };
        let store = create_knowledge_bank(4, &config);
        assert_eq!(store.embedding_dimension(), 4);
        assert_eq!(store.size().await, 0);
    }
}
