use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::KnowledgeBank;
use crate::error::{KnowledgeBankError, KnowledgeBankResult};
use crate::models::{EmbeddingVector, InitializerConfig, StorageBackend};
use crate::snapshot::{self, EmbeddingSnapshot, IN_PROTO_DATA_FILE, StoreMetaData};

/// In-memory knowledge bank backed by an ordered map of protobuf embeddings.
///
/// Each batch call takes the map lock once, so a batch observes and applies a
/// consistent view.
pub struct InProtoKnowledgeBank {
    dimension: usize,
    initializer: InitializerConfig,
    entries: RwLock<BTreeMap<String, EmbeddingVector>>,
}

impl InProtoKnowledgeBank {
    pub fn new(dimension: usize, initializer: InitializerConfig) -> Self {
        Self {
            dimension,
            initializer,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    fn not_found(key: &str) -> KnowledgeBankError {
        KnowledgeBankError::invalid_argument(format!("Data (key: {}) not found.", key))
    }

    fn empty_key() -> KnowledgeBankError {
        KnowledgeBankError::invalid_argument("Empty key.")
    }
}

#[async_trait]
impl KnowledgeBank for InProtoKnowledgeBank {
    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    async fn batch_lookup(&self, keys: &[String]) -> Vec<KnowledgeBankResult<EmbeddingVector>> {
        let entries = self.entries.read().await;
        keys.iter()
            .map(|key| entries.get(key).cloned().ok_or_else(|| Self::not_found(key)))
            .collect()
    }

    async fn batch_lookup_with_update(
        &self,
        keys: &[String],
    ) -> Vec<KnowledgeBankResult<EmbeddingVector>> {
        let mut entries = self.entries.write().await;
        keys.iter()
            .map(|key| {
                if key.is_empty() {
                    return Err(Self::empty_key());
                }
                let entry = entries
                    .entry(key.clone())
                    .and_modify(|e| e.weight += 1.0)
                    .or_insert_with(|| EmbeddingVector {
                        tag: key.clone(),
                        value: self.initializer.initialize(self.dimension),
                        weight: 1.0,
                    });
                Ok(entry.clone())
            })
            .collect()
    }

    async fn batch_update(
        &self,
        keys: &[String],
        values: &[EmbeddingVector],
    ) -> Vec<KnowledgeBankResult<()>> {
        if keys.len() != values.len() {
            let err = format!(
                "Inconsistent keys size and values size: {} v.s. {}",
                keys.len(),
                values.len()
            );
            return keys
                .iter()
                .map(|_| Err(KnowledgeBankError::invalid_argument(err.clone())))
                .collect();
        }

        let mut entries = self.entries.write().await;
        keys.iter()
            .zip(values)
            .map(|(key, value)| {
                if key.is_empty() {
                    return Err(Self::empty_key());
                }
                if value.value.len() != self.dimension {
                    return Err(KnowledgeBankError::invalid_argument(format!(
                        "Inconsistent embedding dimension for key {}: got {} expect {}",
                        key,
                        value.value.len(),
                        self.dimension
                    )));
                }
                entries.insert(
                    key.clone(),
                    EmbeddingVector {
                        tag: key.clone(),
                        value: value.value.clone(),
                        weight: value.weight,
                    },
                );
                Ok(())
            })
            .collect()
    }

    async fn size(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    #[instrument(skip(self), fields(dimension = self.dimension))]
    async fn export(&self, directory: &Path) -> KnowledgeBankResult<PathBuf> {
        let embeddings: Vec<EmbeddingVector> =
            self.entries.read().await.values().cloned().collect();

        let meta = StoreMetaData {
            backend: StorageBackend::InProto,
            embedding_dimension: self.dimension,
            initializer: self.initializer,
            data_file: IN_PROTO_DATA_FILE.to_string(),
            size: embeddings.len(),
        };
        let snapshot = EmbeddingSnapshot {
            embedding_dimension: self.dimension as u64,
            embeddings,
        };

        let meta_path = snapshot::write_store(directory, &meta, &snapshot).await?;
        info!(path = %meta_path.display(), size = meta.size, "Exported knowledge bank");
        Ok(meta_path)
    }

    #[instrument(skip(self), fields(dimension = self.dimension))]
    async fn import(&self, meta_data_path: &Path) -> KnowledgeBankResult<()> {
        let (meta, snapshot) = snapshot::read_store(meta_data_path).await?;

        if meta.backend != StorageBackend::InProto {
            return Err(KnowledgeBankError::internal(format!(
                "Snapshot backend {:?} cannot be imported into an in-proto knowledge bank",
                meta.backend
            )));
        }
        if meta.embedding_dimension != self.dimension {
            return Err(KnowledgeBankError::internal(format!(
                "Inconsistent embedding dimension in snapshot, got {} expect {}",
                meta.embedding_dimension, self.dimension
            )));
        }

        let mut restored = BTreeMap::new();
        for embedding in snapshot.embeddings {
            if embedding.value.len() != self.dimension {
                return Err(KnowledgeBankError::internal(format!(
                    "Snapshot entry {} has dimension {}, expect {}",
                    embedding.tag,
                    embedding.value.len(),
                    self.dimension
                )));
            }
            restored.insert(embedding.tag.clone(), embedding);
        }

        let size = restored.len();
        *self.entries.write().await = restored;
        debug!(size, "Replaced knowledge bank contents from snapshot");
        Ok(())
    }
}
