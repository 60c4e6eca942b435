//! Process-wide map from session handle to its store and optimizer.
//!
//! Lock discipline:
//! - `lookup` holds the shared lock for the whole call, including any store
//!   mutation done by lookup-with-update.
//! - `update` takes the exclusive lock for the values branch, releases it, then
//!   takes it again for fetch + apply + write-back of the gradient branch.
//! - `export` holds the shared lock, `import` the exclusive one.
//! - Session creation is get-or-create under the exclusive lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rpc::knowledge_bank::{DynamicEmbeddingConfig, StartSessionRequest};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::conversions::embedding_dimension;
use crate::error::{KnowledgeBankError, KnowledgeBankResult};
use crate::knowledge_bank::{KnowledgeBank, create_knowledge_bank};
use crate::models::{
    EmbeddingVector, GradientDescentConfig, KnowledgeBankConfig, SessionHandle,
};
use crate::optimizer::GradientDescentOptimizer;

pub const MISSING_OPTIMIZER_MESSAGE: &str = "Optimizer is not created, did you forget to add gradient_descent_config in DynamicEmbeddingConfig?";

struct SessionEntry {
    name: String,
    store: Arc<dyn KnowledgeBank>,
    optimizer: Option<Arc<GradientDescentOptimizer>>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionHandle, SessionEntry>>,
}

fn check_handle(handle: &SessionHandle) -> KnowledgeBankResult<()> {
    if handle.is_empty() {
        return Err(KnowledgeBankError::invalid_argument("session_handle is empty."));
    }
    Ok(())
}

fn build_store(config: &DynamicEmbeddingConfig) -> KnowledgeBankResult<Arc<dyn KnowledgeBank>> {
    let dimension = embedding_dimension(config.embedding_dimension)?;
    let kb_config = config
        .knowledge_bank_config
        .as_ref()
        .ok_or_else(|| KnowledgeBankError::Config("knowledge_bank_config is missing".into()))
        .and_then(KnowledgeBankConfig::try_from)?;
    Ok(create_knowledge_bank(dimension, &kb_config))
}

fn build_optimizer(
    config: &DynamicEmbeddingConfig,
) -> KnowledgeBankResult<Option<GradientDescentOptimizer>> {
    let Some(gd) = config.gradient_descent_config.as_ref() else {
        return Ok(None);
    };
    let dimension = embedding_dimension(config.embedding_dimension)?;
    let gd_config = GradientDescentConfig::try_from(gd)?;
    Ok(Some(GradientDescentOptimizer::new(dimension, gd_config)))
}

/// Drops failed per-key results, logging how many were dropped.
fn collect_found(
    keys: &[String],
    results: Vec<KnowledgeBankResult<EmbeddingVector>>,
) -> KnowledgeBankResult<Vec<(String, EmbeddingVector)>> {
    if results.len() != keys.len() {
        return Err(KnowledgeBankError::internal(
            "Inconsistent result returned by BatchLookup()",
        ));
    }
    let mut found = Vec::with_capacity(keys.len());
    let mut dropped = 0usize;
    for (key, result) in keys.iter().zip(results) {
        match result {
            Ok(embedding) => found.push((key.clone(), embedding)),
            Err(e) => {
                dropped += 1;
                debug!(key = %key, error = %e, "Dropping key from batch");
            }
        }
    }
    if dropped > 0 {
        warn!(dropped, requested = keys.len(), "Some keys failed to resolve");
    }
    Ok(found)
}

fn log_failed_writes(results: &[KnowledgeBankResult<()>], keys: &[String]) -> KnowledgeBankResult<()> {
    if results.len() != keys.len() {
        return Err(KnowledgeBankError::internal(
            "Inconsistent result returned by BatchUpdate()",
        ));
    }
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, requested = keys.len(), "Some keys failed to update");
    }
    Ok(())
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the name, derives the handle and makes sure the session exists.
    #[instrument(skip(self, config))]
    pub async fn start_session(
        &self,
        name: &str,
        config: Option<DynamicEmbeddingConfig>,
    ) -> KnowledgeBankResult<SessionHandle> {
        if name.is_empty() {
            return Err(KnowledgeBankError::invalid_argument("Name is empty."));
        }
        let handle = SessionHandle::from_request(&StartSessionRequest {
            name: name.to_string(),
            config,
        });
        self.ensure_session(&handle).await?;
        Ok(handle)
    }

    /// Creates the store and optimizer for `handle` unless they already exist.
    pub async fn ensure_session(&self, handle: &SessionHandle) -> KnowledgeBankResult<()> {
        check_handle(handle)?;
        let request = handle.decode()?;
        let config = request.config.unwrap_or_default();
        let wants_optimizer = config.gradient_descent_config.is_some();

        {
            let sessions = self.sessions.read().await;
            if let Some(entry) = sessions.get(handle)
                && (!wants_optimizer || entry.optimizer.is_some())
            {
                return Ok(());
            }
        }

        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(handle) {
            let store = build_store(&config).map_err(|e| {
                warn!(error = %e, name = %request.name, "Knowledge bank construction failed");
                KnowledgeBankError::internal("Creating KnowledgeBank failed.")
            })?;
            info!(name = %request.name, dimension = store.embedding_dimension(), "Created knowledge bank");
            sessions.insert(
                handle.clone(),
                SessionEntry {
                    name: request.name.clone(),
                    store,
                    optimizer: None,
                },
            );
        }

        if let Some(entry) = sessions.get_mut(handle)
            && entry.optimizer.is_none()
            && wants_optimizer
        {
            let optimizer = build_optimizer(&config)
                .map_err(|e| {
                    warn!(error = %e, name = %request.name, "Optimizer construction failed");
                    KnowledgeBankError::internal("Creating GradientDescentOptimizer failed.")
                })?
                .map(Arc::new);
            entry.optimizer = optimizer;
            info!(name = %request.name, "Created gradient descent optimizer");
        }
        Ok(())
    }

    #[instrument(skip(self, handle, keys), fields(keys = keys.len()))]
    pub async fn lookup(
        &self,
        handle: &SessionHandle,
        keys: &[String],
        update: bool,
    ) -> KnowledgeBankResult<HashMap<String, EmbeddingVector>> {
        check_handle(handle)?;
        if keys.is_empty() {
            return Err(KnowledgeBankError::invalid_argument("Empty input keys."));
        }
        self.ensure_session(handle).await?;

        let sessions = self.sessions.read().await;
        let entry = Self::entry(&sessions, handle)?;
        let results = if update {
            entry.store.batch_lookup_with_update(keys).await
        } else {
            entry.store.batch_lookup(keys).await
        };

        Ok(collect_found(keys, results)?.into_iter().collect())
    }

    #[instrument(skip_all, fields(values = values.len(), gradients = gradients.len()))]
    pub async fn update(
        &self,
        handle: &SessionHandle,
        values: HashMap<String, EmbeddingVector>,
        gradients: HashMap<String, EmbeddingVector>,
    ) -> KnowledgeBankResult<()> {
        check_handle(handle)?;
        if values.is_empty() && gradients.is_empty() {
            return Err(KnowledgeBankError::invalid_argument("input is empty."));
        }
        self.ensure_session(handle).await?;

        if !values.is_empty() {
            let (keys, vectors): (Vec<String>, Vec<EmbeddingVector>) = values.into_iter().unzip();
            let sessions = self.sessions.write().await;
            let entry = Self::entry(&sessions, handle)?;
            let results = entry.store.batch_update(&keys, &vectors).await;
            log_failed_writes(&results, &keys)?;
        }

        if !gradients.is_empty() {
            let (keys, gradients): (Vec<String>, Vec<EmbeddingVector>) =
                gradients.into_iter().unzip();
            let sessions = self.sessions.write().await;
            let entry = Self::entry(&sessions, handle)?;
            let optimizer = entry
                .optimizer
                .as_ref()
                .ok_or_else(|| KnowledgeBankError::internal(MISSING_OPTIMIZER_MESSAGE))?;

            // Embeddings come only from keys that resolved while gradients keep
            // the full key list, so a partial fetch shows up as a size error.
            let found = collect_found(&keys, entry.store.batch_lookup(&keys).await)?;
            if found.is_empty() {
                return Err(KnowledgeBankError::internal(
                    "No valid keys for gradient update.",
                ));
            }
            let (valid_keys, embeddings): (Vec<String>, Vec<EmbeddingVector>) =
                found.into_iter().unzip();

            let updated = optimizer.apply(&embeddings, &gradients).await.map_err(|e| {
                KnowledgeBankError::internal(format!(
                    "Applying gradient update returned error: {}",
                    e
                ))
            })?;

            let results = entry.store.batch_update(&valid_keys, &updated).await;
            log_failed_writes(&results, &valid_keys)?;
        }
        Ok(())
    }

    /// Number of live sessions.
    pub async fn size(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Writes the session's store and optimizer state under `{directory}/{session name}`.
    #[instrument(skip(self, handle))]
    pub async fn export(
        &self,
        handle: &SessionHandle,
        directory: &Path,
    ) -> KnowledgeBankResult<PathBuf> {
        check_handle(handle)?;
        if directory.as_os_str().is_empty() {
            return Err(KnowledgeBankError::invalid_argument("export_directory is empty."));
        }
        self.ensure_session(handle).await?;

        let sessions = self.sessions.read().await;
        let entry = Self::entry(&sessions, handle)?;
        let session_dir = directory.join(&entry.name);
        let meta_path = entry.store.export(&session_dir).await?;
        if let Some(optimizer) = &entry.optimizer {
            optimizer.export_state(&session_dir).await?;
        }
        Ok(meta_path)
    }

    /// Replaces the session's store and optimizer state from an exported snapshot.
    #[instrument(skip(self, handle))]
    pub async fn import(&self, handle: &SessionHandle, meta_path: &Path) -> KnowledgeBankResult<()> {
        check_handle(handle)?;
        if meta_path.as_os_str().is_empty() {
            return Err(KnowledgeBankError::invalid_argument(
                "knowledge_bank_saved_path is empty.",
            ));
        }
        self.ensure_session(handle).await?;

        let sessions = self.sessions.write().await;
        let entry = Self::entry(&sessions, handle)?;
        let session_dir = meta_path.parent().unwrap_or_else(|| Path::new("."));

        let optimizer_state = match &entry.optimizer {
            Some(optimizer) => Some(optimizer.load_state(session_dir).await?),
            None => None,
        };
        entry.store.import(meta_path).await?;
        if let (Some(optimizer), Some(state)) = (&entry.optimizer, optimizer_state) {
            optimizer.restore_state(state).await;
        }
        info!(path = %meta_path.display(), "Imported knowledge bank");
        Ok(())
    }

    fn entry<'a>(
        sessions: &'a HashMap<SessionHandle, SessionEntry>,
        handle: &SessionHandle,
    ) -> KnowledgeBankResult<&'a SessionEntry> {
        sessions
            .get(handle)
            .ok_or_else(|| KnowledgeBankError::internal("Session disappeared after creation."))
    }

    #[cfg(test)]
    pub(crate) async fn insert_session(
        &self,
        handle: SessionHandle,
        name: &str,
        store: Arc<dyn KnowledgeBank>,
        optimizer: Option<GradientDescentOptimizer>,
    ) {
        self.sessions.write().await.insert(
            handle,
            SessionEntry {
                name: name.to_string(),
                store,
                optimizer: optimizer.map(Arc::new),
            },
        );
    }
}
