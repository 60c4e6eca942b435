//! Gradient descent update rules applied to batches of embeddings.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{KnowledgeBankError, KnowledgeBankResult};
use crate::models::{EmbeddingVector, GradientDescentConfig, OptimizerRule};
use crate::snapshot::{self, AccumulatorEntry, OptimizerSnapshot};

pub struct GradientDescentOptimizer {
    dimension: usize,
    config: GradientDescentConfig,
    /// Adagrad sums of squared gradients, keyed by embedding tag.
    accumulators: Mutex<HashMap<String, Vec<f32>>>,
}

impl GradientDescentOptimizer {
    pub fn new(dimension: usize, config: GradientDescentConfig) -> Self {
        Self {
            dimension,
            config,
            accumulators: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GradientDescentConfig {
        &self.config
    }

    /// Returns updated copies of `embeddings`, keeping each input's tag and weight.
    ///
    /// `embeddings[i]` is paired with `gradients[i]`; both lists must have the
    /// same length and every vector must have the configured dimension.
    pub async fn apply(
        &self,
        embeddings: &[EmbeddingVector],
        gradients: &[EmbeddingVector],
    ) -> KnowledgeBankResult<Vec<EmbeddingVector>> {
        if embeddings.len() != gradients.len() {
            return Err(KnowledgeBankError::internal(format!(
                "Inconsistent (embedding, gradient) sizes: {} v.s. {}",
                embeddings.len(),
                gradients.len()
            )));
        }
        if embeddings.is_empty() {
            return Err(KnowledgeBankError::internal("Empty input."));
        }
        for (i, (embedding, gradient)) in embeddings.iter().zip(gradients).enumerate() {
            for len in [embedding.value.len(), gradient.value.len()] {
                if len != self.dimension {
                    return Err(KnowledgeBankError::internal(format!(
                        "Inconsistent dimension at index {}: got {} expect {}",
                        i, len, self.dimension
                    )));
                }
            }
        }

        let lr = self.config.learning_rate;
        match self.config.rule {
            OptimizerRule::Sgd => Ok(embeddings
                .iter()
                .zip(gradients)
                .map(|(embedding, gradient)| EmbeddingVector {
                    tag: embedding.tag.clone(),
                    value: embedding
                        .value
                        .iter()
                        .zip(&gradient.value)
                        .map(|(v, g)| v - lr * g)
                        .collect(),
                    weight: embedding.weight,
                })
                .collect()),
            OptimizerRule::Adagrad {
                init_accumulator_value,
            } => {
                let mut accumulators = self.accumulators.lock().await;
                let updated = embeddings
                    .iter()
                    .zip(gradients)
                    .map(|(embedding, gradient)| {
                        let acc = accumulators
                            .entry(embedding.tag.clone())
                            .or_insert_with(|| vec![init_accumulator_value; self.dimension]);
                        let value = embedding
                            .value
                            .iter()
                            .zip(&gradient.value)
                            .zip(acc.iter_mut())
                            .map(|((v, g), a)| {
                                *a += g * g;
                                v - lr * g / a.sqrt()
                            })
                            .collect();
                        EmbeddingVector {
                            tag: embedding.tag.clone(),
                            value,
                            weight: embedding.weight,
                        }
                    })
                    .collect();
                Ok(updated)
            }
        }
    }

    /// Current Adagrad accumulator for `tag`, if one was created.
    pub async fn accumulator(&self, tag: &str) -> Option<Vec<f32>> {
        self.accumulators.lock().await.get(tag).cloned()
    }

    /// Writes optimizer state next to a store snapshot. SGD is stateless and writes nothing.
    pub async fn export_state(&self, directory: &Path) -> KnowledgeBankResult<()> {
        if matches!(self.config.rule, OptimizerRule::Sgd) {
            return Ok(());
        }
        let mut accumulators: Vec<AccumulatorEntry> = self
            .accumulators
            .lock()
            .await
            .iter()
            .map(|(key, values)| AccumulatorEntry {
                key: key.clone(),
                values: values.clone(),
            })
            .collect();
        accumulators.sort_by(|a, b| a.key.cmp(&b.key));

        let count = accumulators.len();
        let path = snapshot::write_optimizer_state(
            directory,
            &OptimizerSnapshot {
                embedding_dimension: self.dimension as u64,
                accumulators,
            },
        )
        .await?;
        debug!(path = %path.display(), count, "Exported optimizer state");
        Ok(())
    }

    /// Reads and validates optimizer state from `directory` without applying it.
    ///
    /// A directory without a state file yields an empty state.
    pub async fn load_state(&self, directory: &Path) -> KnowledgeBankResult<OptimizerState> {
        let Some(snapshot) = snapshot::read_optimizer_state(directory).await? else {
            return Ok(OptimizerState::default());
        };
        if snapshot.embedding_dimension as usize != self.dimension {
            return Err(KnowledgeBankError::internal(format!(
                "Inconsistent optimizer state dimension, got {} expect {}",
                snapshot.embedding_dimension, self.dimension
            )));
        }
        let mut accumulators = HashMap::with_capacity(snapshot.accumulators.len());
        for entry in snapshot.accumulators {
            if entry.values.len() != self.dimension {
                return Err(KnowledgeBankError::internal(format!(
                    "Optimizer state entry {} has dimension {}, expect {}",
                    entry.key,
                    entry.values.len(),
                    self.dimension
                )));
            }
            accumulators.insert(entry.key, entry.values);
        }
        Ok(OptimizerState { accumulators })
    }

    /// Replaces all optimizer state.
    pub async fn restore_state(&self, state: OptimizerState) {
        let count = state.accumulators.len();
        *self.accumulators.lock().await = state.accumulators;
        debug!(count, "Restored optimizer state");
    }
}

/// Optimizer state loaded from disk, ready for [`GradientDescentOptimizer::restore_state`].
#[derive(Debug, Default)]
pub struct OptimizerState {
    accumulators: HashMap<String, Vec<f32>>,
}
