//! Client-side batch manager.
//!
//! Turns rectangular batches of string keys and float rows into
//! `KnowledgeBankService` calls against one session. The empty key is padding:
//! it is never sent, never written, and always reads back as zeros.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use grpc_client::{TracingInterceptor, create_channel_with_config, normalize_address};
use rpc::knowledge_bank::{
    DynamicEmbeddingConfig, ExportRequest, ImportRequest, KnowledgeBankSizeRequest, LookupRequest,
    StartSessionRequest, UpdateRequest,
    knowledge_bank_service_client::KnowledgeBankServiceClient,
};
use tonic::codec::CompressionEncoding;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{debug, info, instrument, warn};

use crate::batch::Tensor;
use crate::config::ManagerOptions;
use crate::error::{KnowledgeBankError, KnowledgeBankResult};
use crate::models::{EmbeddingConfig, EmbeddingVector, SessionHandle};

const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

type Client = KnowledgeBankServiceClient<InterceptedService<Channel, TracingInterceptor>>;

/// A connected session on a knowledge bank server.
///
/// The session handle is obtained once by `create` and reused for every call.
#[derive(Clone)]
pub struct BatchManager {
    name: String,
    dimension: usize,
    handle: SessionHandle,
    client: Client,
    options: ManagerOptions,
}

impl std::fmt::Debug for BatchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchManager")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BatchManager {
    /// Connects and starts the session with default options.
    ///
    /// Returns `None` for an empty address, a malformed config, or a failed
    /// connection or `StartSession` call. The cause is logged.
    pub async fn create(
        config: DynamicEmbeddingConfig,
        name: &str,
        address: &str,
    ) -> Option<Self> {
        Self::create_with_options(config, name, address, ManagerOptions::default()).await
    }

    pub async fn create_with_options(
        config: DynamicEmbeddingConfig,
        name: &str,
        address: &str,
        options: ManagerOptions,
    ) -> Option<Self> {
        match Self::try_create(config, name, address, options).await {
            Ok(manager) => Some(manager),
            Err(e) => {
                warn!(name, address, error = %e, "Creating BatchManager failed");
                None
            }
        }
    }

    /// Like [`create_with_options`](Self::create_with_options) but keeps the error.
    #[instrument(skip(config, options))]
    pub async fn try_create(
        config: DynamicEmbeddingConfig,
        name: &str,
        address: &str,
        options: ManagerOptions,
    ) -> KnowledgeBankResult<Self> {
        if address.trim().is_empty() {
            return Err(KnowledgeBankError::invalid_argument("Empty address."));
        }
        let validated = EmbeddingConfig::try_from(&config)?;

        let channel =
            create_channel_with_config(normalize_address(address), options.channel_config())
                .await?;
        let mut client = KnowledgeBankServiceClient::with_interceptor(
            channel,
            TracingInterceptor::new(),
        )
        .max_decoding_message_size(MAX_MESSAGE_SIZE)
        .max_encoding_message_size(MAX_MESSAGE_SIZE);
        if options.compression {
            client = client
                .send_compressed(CompressionEncoding::Zstd)
                .accept_compressed(CompressionEncoding::Zstd);
        }

        let request = with_deadline(
            StartSessionRequest {
                name: name.to_string(),
                config: Some(config),
            },
            &options,
        );
        let response = client.start_session(request).await?.into_inner();
        let handle = SessionHandle::from_bytes(response.session_handle);

        info!(name, dimension = validated.dimension, "Session started");

        Ok(Self {
            name: name.to_string(),
            dimension: validated.dimension,
            handle,
            client,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    pub fn session_handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Looks up every key in `keys`, returning a tensor shaped like `keys`
    /// with a trailing embedding axis.
    ///
    /// Unresolved keys, padding included, come back as zero rows.
    #[instrument(skip(self, keys), fields(name = %self.name, keys = keys.len()))]
    pub async fn lookup(
        &self,
        keys: &Tensor<String>,
        update: bool,
    ) -> KnowledgeBankResult<Tensor<f32>> {
        if keys.is_empty() {
            return Err(KnowledgeBankError::invalid_argument("No input."));
        }

        let mut shape = keys.shape().to_vec();
        shape.push(self.dimension);
        let mut output = Tensor::zeros(shape);

        let request_keys: Vec<String> = keys
            .data()
            .iter()
            .filter(|k| !k.is_empty())
            .cloned()
            .collect();
        if request_keys.is_empty() {
            debug!("Batch is all padding, skipping RPC");
            return Ok(output);
        }

        let mut client = self.client.clone();
        let request = with_deadline(
            LookupRequest {
                session_handle: self.handle.as_bytes().to_vec(),
                key: request_keys,
                update,
            },
            &self.options,
        );
        let table = client.lookup(request).await?.into_inner().embedding_table;

        let dim = self.dimension;
        let out = output.data_mut();
        for (i, key) in keys.data().iter().enumerate() {
            let Some(embedding) = table.get(key) else {
                continue;
            };
            if embedding.value.len() != dim {
                return Err(KnowledgeBankError::internal(format!(
                    "Inconsistent embedding dimension for key {}: got {} expect {}",
                    key,
                    embedding.value.len(),
                    dim
                )));
            }
            out[i * dim..(i + 1) * dim].copy_from_slice(&embedding.value);
        }
        Ok(output)
    }

    /// Overwrites the stored vector of every non-padding key.
    #[instrument(skip(self, keys, values), fields(name = %self.name, keys = keys.len()))]
    pub async fn update_values(
        &self,
        keys: &Tensor<String>,
        values: &Tensor<f32>,
    ) -> KnowledgeBankResult<()> {
        let values = self.to_map(keys, values)?;
        if values.is_empty() {
            debug!("Batch is all padding, skipping RPC");
            return Ok(());
        }
        self.send_update(values, HashMap::new()).await
    }

    /// Applies one optimizer step to every non-padding key.
    #[instrument(skip(self, keys, gradients), fields(name = %self.name, keys = keys.len()))]
    pub async fn update_gradients(
        &self,
        keys: &Tensor<String>,
        gradients: &Tensor<f32>,
    ) -> KnowledgeBankResult<()> {
        let gradients = self.to_map(keys, gradients)?;
        if gradients.is_empty() {
            debug!("Batch is all padding, skipping RPC");
            return Ok(());
        }
        self.send_update(HashMap::new(), gradients).await
    }

    /// Saves the session under `{directory}/{name}` and returns the meta-data
    /// path to pass to [`import`](Self::import).
    #[instrument(skip(self), fields(name = %self.name))]
    pub async fn export(&self, directory: &Path) -> KnowledgeBankResult<PathBuf> {
        let mut client = self.client.clone();
        let request = with_deadline(
            ExportRequest {
                session_handle: self.handle.as_bytes().to_vec(),
                export_directory: directory.to_string_lossy().into_owned(),
            },
            &self.options,
        );
        let response = client.export(request).await?.into_inner();
        Ok(PathBuf::from(response.knowledge_bank_saved_path))
    }

    /// Replaces the session's state with the snapshot at `path`.
    #[instrument(skip(self), fields(name = %self.name))]
    pub async fn import(&self, path: &Path) -> KnowledgeBankResult<()> {
        let mut client = self.client.clone();
        let request = with_deadline(
            ImportRequest {
                session_handle: self.handle.as_bytes().to_vec(),
                knowledge_bank_saved_path: path.to_string_lossy().into_owned(),
            },
            &self.options,
        );
        client.import(request).await?;
        Ok(())
    }

    /// Number of sessions on the server, across all clients.
    pub async fn session_count(&self) -> KnowledgeBankResult<u64> {
        let mut client = self.client.clone();
        let request = with_deadline(KnowledgeBankSizeRequest {}, &self.options);
        Ok(client.knowledge_bank_size(request).await?.into_inner().size)
    }

    fn to_map(
        &self,
        keys: &Tensor<String>,
        rows: &Tensor<f32>,
    ) -> KnowledgeBankResult<HashMap<String, EmbeddingVector>> {
        if keys.is_empty() {
            return Err(KnowledgeBankError::invalid_argument("Input key is empty."));
        }
        if keys.len() != rows.outer_len() {
            return Err(KnowledgeBankError::invalid_argument(format!(
                "Inconsistent keys size and values size: {} v.s. {}",
                keys.len(),
                rows.outer_len()
            )));
        }
        if rows.inner_dim() != self.dimension {
            return Err(KnowledgeBankError::invalid_argument(format!(
                "Inconsistent embedding dimension, got {} expect {}",
                rows.inner_dim(),
                self.dimension
            )));
        }

        Ok(keys
            .data()
            .iter()
            .zip(rows.rows())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, row)| {
                (
                    key.clone(),
                    EmbeddingVector {
                        tag: key.clone(),
                        value: row.to_vec(),
                        weight: 0.0,
                    },
                )
            })
            .collect())
    }

    async fn send_update(
        &self,
        values: HashMap<String, EmbeddingVector>,
        gradients: HashMap<String, EmbeddingVector>,
    ) -> KnowledgeBankResult<()> {
        let mut client = self.client.clone();
        let request = with_deadline(
            UpdateRequest {
                session_handle: self.handle.as_bytes().to_vec(),
                values,
                gradients,
            },
            &self.options,
        );
        client.update(request).await?;
        Ok(())
    }
}

fn with_deadline<T>(message: T, options: &ManagerOptions) -> Request<T> {
    let mut request = Request::new(message);
    if let Some(timeout) = options.timeout {
        request.set_timeout(timeout);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_deadline_sets_grpc_timeout_header() {
        let options = ManagerOptions::default().with_timeout(std::time::Duration::from_millis(250));
        let request = with_deadline((), &options);
        assert!(request.metadata().get("grpc-timeout").is_some());

        let request = with_deadline((), &ManagerOptions::default());
        assert!(request.metadata().get("grpc-timeout").is_none());
    }

    #[tokio::test]
    async fn test_create_with_empty_address_is_none() {
        let manager = BatchManager::create(DynamicEmbeddingConfig::default(), "emb", "").await;
        assert!(manager.is_none());
    }

    #[tokio::test]
    async fn test_malformed_config_fails_before_connecting() {
        let config = DynamicEmbeddingConfig {
            embedding_dimension: 0,
            ..Default::default()
        };
        let err = BatchManager::try_create(config, "emb", "127.0.0.1:1", ManagerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeBankError::Config(_)));
    }
}
