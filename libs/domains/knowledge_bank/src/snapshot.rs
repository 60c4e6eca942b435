//! On-disk snapshot layout shared by the in-proto store and the optimizer.
//!
//! A session directory holds:
//! - `embedding_store_meta_data.pbtxt`: JSON meta data naming the data file
//! - `in_proto_embedding_data.pbbin`: protobuf [`EmbeddingSnapshot`]
//! - `optimizer_state.pbbin`: protobuf [`OptimizerSnapshot`], Adagrad only

use std::path::{Path, PathBuf};

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeBankError, KnowledgeBankResult};
use crate::models::{EmbeddingVector, InitializerConfig, StorageBackend};

pub(crate) const META_DATA_FILE: &str = "embedding_store_meta_data.pbtxt";
pub(crate) const IN_PROTO_DATA_FILE: &str = "in_proto_embedding_data.pbbin";
pub(crate) const OPTIMIZER_STATE_FILE: &str = "optimizer_state.pbbin";

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct EmbeddingSnapshot {
    #[prost(uint64, tag = "1")]
    pub embedding_dimension: u64,
    #[prost(message, repeated, tag = "2")]
    pub embeddings: Vec<EmbeddingVector>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct AccumulatorEntry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(float, repeated, tag = "2")]
    pub values: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct OptimizerSnapshot {
    #[prost(uint64, tag = "1")]
    pub embedding_dimension: u64,
    #[prost(message, repeated, tag = "2")]
    pub accumulators: Vec<AccumulatorEntry>,
}

/// Contents of the meta-data file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoreMetaData {
    pub backend: StorageBackend,
    pub embedding_dimension: usize,
    pub initializer: InitializerConfig,
    /// Data file name, relative to the meta-data file's directory.
    pub data_file: String,
    pub size: usize,
}

/// Writes the data file and the meta-data file into `directory`, creating it.
pub(crate) async fn write_store(
    directory: &Path,
    meta: &StoreMetaData,
    snapshot: &EmbeddingSnapshot,
) -> KnowledgeBankResult<PathBuf> {
    tokio::fs::create_dir_all(directory).await?;

    tokio::fs::write(directory.join(&meta.data_file), snapshot.encode_to_vec()).await?;

    let meta_path = directory.join(META_DATA_FILE);
    tokio::fs::write(&meta_path, serde_json::to_vec_pretty(meta)?).await?;
    Ok(meta_path)
}

/// Reads a snapshot written by [`write_store`], starting from its meta-data path.
pub(crate) async fn read_store(
    meta_path: &Path,
) -> KnowledgeBankResult<(StoreMetaData, EmbeddingSnapshot)> {
    let meta: StoreMetaData = serde_json::from_slice(&tokio::fs::read(meta_path).await?)?;
    let directory = meta_path.parent().unwrap_or_else(|| Path::new("."));
    let bytes = tokio::fs::read(directory.join(&meta.data_file)).await?;
    let snapshot = EmbeddingSnapshot::decode(bytes.as_slice())?;

    if snapshot.embedding_dimension as usize != meta.embedding_dimension {
        return Err(KnowledgeBankError::internal(format!(
            "Snapshot dimension {} does not match meta data dimension {}",
            snapshot.embedding_dimension, meta.embedding_dimension
        )));
    }
    Ok((meta, snapshot))
}

pub(crate) async fn write_optimizer_state(
    directory: &Path,
    snapshot: &OptimizerSnapshot,
) -> KnowledgeBankResult<PathBuf> {
    tokio::fs::create_dir_all(directory).await?;
    let path = directory.join(OPTIMIZER_STATE_FILE);
    tokio::fs::write(&path, snapshot.encode_to_vec()).await?;
    Ok(path)
}

/// Reads optimizer state from `directory`. A missing file yields `None`.
pub(crate) async fn read_optimizer_state(
    directory: &Path,
) -> KnowledgeBankResult<Option<OptimizerSnapshot>> {
    match tokio::fs::read(directory.join(OPTIMIZER_STATE_FILE)).await {
        Ok(bytes) => Ok(Some(OptimizerSnapshot::decode(bytes.as_slice())?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(size: usize) -> StoreMetaData {
        StoreMetaData {
            backend: StorageBackend::InProto,
            embedding_dimension: 2,
            initializer: InitializerConfig::Zero,
            data_file: IN_PROTO_DATA_FILE.to_string(),
            size,
        }
    }

    #[tokio::test]
    async fn test_store_files_written_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = EmbeddingSnapshot {
            embedding_dimension: 2,
            embeddings: vec![EmbeddingVector {
                tag: "a".into(),
                value: vec![1.0, 2.0],
                weight: 3.0,
            }],
        };

        let meta_path = write_store(dir.path(), &meta(1), &snapshot).await.unwrap();
        assert_eq!(meta_path, dir.path().join(META_DATA_FILE));
        assert!(dir.path().join(IN_PROTO_DATA_FILE).exists());

        let (read_meta, read_snapshot) = read_store(&meta_path).await.unwrap();
        assert_eq!(read_meta, meta(1));
        assert_eq!(read_snapshot, snapshot);
    }

    #[tokio::test]
    async fn test_meta_data_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let meta_path = write_store(dir.path(), &meta(0), &EmbeddingSnapshot::default())
            .await
            .unwrap();
        let text = std::fs::read_to_string(meta_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["backend"], "in_proto");
        assert_eq!(value["data_file"], IN_PROTO_DATA_FILE);
    }

    #[tokio::test]
    async fn test_read_store_rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = EmbeddingSnapshot {
            embedding_dimension: 3,
            embeddings: vec![],
        };
        let meta_path = write_store(dir.path(), &meta(0), &snapshot).await.unwrap();
        assert!(matches!(
            read_store(&meta_path).await,
            Err(KnowledgeBankError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_optimizer_state_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optimizer_state(dir.path()).await.unwrap().is_none());

        let state = OptimizerSnapshot {
            embedding_dimension: 2,
            accumulators: vec![AccumulatorEntry {
                key: "a".into(),
                values: vec![0.1, 0.2],
            }],
        };
        write_optimizer_state(dir.path(), &state).await.unwrap();
        assert_eq!(read_optimizer_state(dir.path()).await.unwrap(), Some(state));
    }
}
