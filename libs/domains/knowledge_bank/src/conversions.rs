//! Protobuf ↔ domain conversions
//!
//! Config messages are validated here once; everything downstream works with the
//! domain types from [`crate::models`].

use rpc::knowledge_bank::{
    self as proto, embedding_initializer, gradient_descent_config, knowledge_bank_config,
};

use crate::error::KnowledgeBankError;
use crate::models::{
    DEFAULT_ADAGRAD_INIT_ACCUMULATOR, EmbeddingConfig, GradientDescentConfig, InitializerConfig,
    KnowledgeBankConfig, OptimizerRule, StorageBackend,
};

fn config_error(msg: impl Into<String>) -> KnowledgeBankError {
    KnowledgeBankError::Config(msg.into())
}

/// Checks `embedding_dimension > 0` and widens it.
pub fn embedding_dimension(raw: i32) -> Result<usize, KnowledgeBankError> {
    if raw <= 0 {
        return Err(config_error(format!(
            "embedding_dimension must be positive, got {}",
            raw
        )));
    }
    Ok(raw as usize)
}

impl TryFrom<&proto::EmbeddingInitializer> for InitializerConfig {
    type Error = KnowledgeBankError;

    fn try_from(value: &proto::EmbeddingInitializer) -> Result<Self, Self::Error> {
        match value.r#type {
            None | Some(embedding_initializer::Type::ZeroInitializer(_)) => {
                Ok(InitializerConfig::Zero)
            }
            Some(embedding_initializer::Type::RandomUniformInitializer(r)) => {
                if !(r.low < r.high) {
                    return Err(config_error(format!(
                        "random_uniform_initializer requires low < high, got [{}, {})",
                        r.low, r.high
                    )));
                }
                Ok(InitializerConfig::RandomUniform {
                    low: r.low,
                    high: r.high,
                })
            }
        }
    }
}

impl From<InitializerConfig> for proto::EmbeddingInitializer {
    fn from(value: InitializerConfig) -> Self {
        let r#type = match value {
            InitializerConfig::Zero => {
                embedding_initializer::Type::ZeroInitializer(proto::ZeroInitializer {})
            }
            InitializerConfig::RandomUniform { low, high } => {
                embedding_initializer::Type::RandomUniformInitializer(
                    proto::RandomUniformInitializer { low, high },
                )
            }
        };
        proto::EmbeddingInitializer {
            r#type: Some(r#type),
        }
    }
}

impl TryFrom<&proto::KnowledgeBankConfig> for KnowledgeBankConfig {
    type Error = KnowledgeBankError;

    fn try_from(value: &proto::KnowledgeBankConfig) -> Result<Self, Self::Error> {
        let backend = match value.extension {
            Some(knowledge_bank_config::Extension::InProto(_)) => StorageBackend::InProto,
            None => return Err(config_error("knowledge_bank_config has no backend extension")),
        };
        let initializer = value
            .initializer
            .as_ref()
            .map(InitializerConfig::try_from)
            .transpose()?
            .unwrap_or_default();

        Ok(KnowledgeBankConfig {
            initializer,
            backend,
        })
    }
}

impl From<&KnowledgeBankConfig> for proto::KnowledgeBankConfig {
    fn from(value: &KnowledgeBankConfig) -> Self {
        let extension = match value.backend {
            StorageBackend::InProto => {
                knowledge_bank_config::Extension::InProto(proto::InProtoKnowledgeBankConfig {})
            }
        };
        proto::KnowledgeBankConfig {
            initializer: Some(value.initializer.into()),
            extension: Some(extension),
        }
    }
}

impl TryFrom<&proto::GradientDescentConfig> for GradientDescentConfig {
    type Error = KnowledgeBankError;

    fn try_from(value: &proto::GradientDescentConfig) -> Result<Self, Self::Error> {
        if !(value.learning_rate > 0.0) {
            return Err(config_error(format!(
                "learning_rate must be positive, got {}",
                value.learning_rate
            )));
        }
        let rule = match value.optimizer {
            Some(gradient_descent_config::Optimizer::Sgd(_)) => OptimizerRule::Sgd,
            Some(gradient_descent_config::Optimizer::Adagrad(a)) => {
                let init_accumulator_value = if a.init_accumulator_value > 0.0 {
                    a.init_accumulator_value
                } else {
                    DEFAULT_ADAGRAD_INIT_ACCUMULATOR
                };
                OptimizerRule::Adagrad {
                    init_accumulator_value,
                }
            }
            None => return Err(config_error("gradient_descent_config has no optimizer")),
        };

        Ok(GradientDescentConfig {
            learning_rate: value.learning_rate,
            rule,
        })
    }
}

impl From<&GradientDescentConfig> for proto::GradientDescentConfig {
    fn from(value: &GradientDescentConfig) -> Self {
        let optimizer = match value.rule {
            OptimizerRule::Sgd => gradient_descent_config::Optimizer::Sgd(proto::SgdConfig {}),
            OptimizerRule::Adagrad {
                init_accumulator_value,
            } => gradient_descent_config::Optimizer::Adagrad(proto::AdagradConfig {
                init_accumulator_value,
            }),
        };
        proto::GradientDescentConfig {
            learning_rate: value.learning_rate,
            optimizer: Some(optimizer),
        }
    }
}

impl TryFrom<&proto::DynamicEmbeddingConfig> for EmbeddingConfig {
    type Error = KnowledgeBankError;

    fn try_from(value: &proto::DynamicEmbeddingConfig) -> Result<Self, Self::Error> {
        let dimension = embedding_dimension(value.embedding_dimension)?;
        let knowledge_bank = value
            .knowledge_bank_config
            .as_ref()
            .ok_or_else(|| config_error("knowledge_bank_config is missing"))
            .and_then(KnowledgeBankConfig::try_from)?;
        let gradient_descent = value
            .gradient_descent_config
            .as_ref()
            .map(GradientDescentConfig::try_from)
            .transpose()?;

        Ok(EmbeddingConfig {
            dimension,
            knowledge_bank,
            gradient_descent,
        })
    }
}

impl From<&EmbeddingConfig> for proto::DynamicEmbeddingConfig {
    fn from(value: &EmbeddingConfig) -> Self {
        proto::DynamicEmbeddingConfig {
            embedding_dimension: value.dimension as i32,
            knowledge_bank_config: Some((&value.knowledge_bank).into()),
            gradient_descent_config: value.gradient_descent.as_ref().map(Into::into),
        }
    }
}
