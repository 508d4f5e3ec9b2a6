//! Run configuration.
//!
//! [`RunConfig`] is the full set of knobs for one experiment: graph
//! generation, network shape, training schedule and QUBO penalty. It
//! resolves into the narrower values each stage consumes:
//!
//! - [`RunConfig::generator_config`] for the graph generator
//! - [`RunConfig::hyperparameters`] for the network and training loop
//! - [`RunConfig::optimizer_params`] for the optimizer
//!
//! # Example
//!
//! ```rust
//! use misrelax_nn::RunConfig;
//!
//! let config = RunConfig::default()
//!     .with_n(64)
//!     .with_learning_rate(1e-3)
//!     .with_seed(7);
//! config.validate().unwrap();
//!
//! let hp = config.hyperparameters();
//! assert_eq!(hp.dim_embedding, 8);
//! assert_eq!(hp.hidden_dim, 4);
//! ```

use crate::{Error, Result};
use misrelax_core::qubo::DEFAULT_PENALTY;
use misrelax_core::{GeneratorConfig, GraphType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration for one solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Graph size.
    pub n: usize,
    /// Node degree for regular graphs (`d`).
    #[serde(alias = "d")]
    pub degree: usize,
    /// Edge probability for probabilistic graphs (`p`).
    #[serde(alias = "p")]
    pub probability: Option<f64>,
    /// Graph family.
    pub graph_type: GraphType,
    /// Node embedding width (default: `round(sqrt(n))`).
    pub dim_embedding: Option<usize>,
    /// Hidden layer width (default: `dim_embedding / 2`).
    pub hidden_dim: Option<usize>,
    /// Dropout rate after the hidden layer (default: 0, off).
    pub dropout: f32,
    /// Outputs per node; must be 1.
    pub number_classes: usize,
    /// Probability at or above which a node is included (default: 0.5).
    pub prob_threshold: f32,
    /// Epoch budget (default: 100_000).
    pub number_epochs: usize,
    /// Loss change below which an epoch counts as stalled (default: 1e-4).
    pub tolerance: f32,
    /// Stalled epochs tolerated before stopping (default: 100).
    pub patience: usize,
    /// Optimizer learning rate (default: 1e-4).
    pub learning_rate: f64,
    /// Decoupled weight decay; 0 gives plain Adam (default: 0).
    pub weight_decay: f64,
    /// QUBO edge penalty (default: 2).
    pub penalty: f64,
    /// Seed for graph generation and parameter initialisation.
    pub random_seed: u64,
    /// Log progress every this many epochs (default: 1000).
    pub log_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n: 100,
            degree: 3,
            probability: None,
            graph_type: GraphType::Regular,
            dim_embedding: None,
            hidden_dim: None,
            dropout: 0.0,
            number_classes: 1,
            prob_threshold: 0.5,
            number_epochs: 100_000,
            tolerance: 1e-4,
            patience: 100,
            learning_rate: 1e-4,
            weight_decay: 0.0,
            penalty: DEFAULT_PENALTY,
            random_seed: 1,
            log_every: 1000,
        }
    }
}

impl RunConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.graph_type = GraphType::Regular;
        self.degree = degree;
        self
    }

    pub fn with_probability(mut self, p: f64) -> Self {
        self.graph_type = GraphType::Probabilistic;
        self.probability = Some(p);
        self
    }

    pub fn with_dims(mut self, dim_embedding: usize, hidden_dim: usize) -> Self {
        self.dim_embedding = Some(dim_embedding);
        self.hidden_dim = Some(hidden_dim);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.number_epochs = epochs;
        self
    }

    pub fn with_early_stopping(mut self, tolerance: f32, patience: usize) -> Self {
        self.tolerance = tolerance;
        self.patience = patience;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Reject configurations that cannot run, before any tensors exist.
    pub fn validate(&self) -> Result<()> {
        self.generator_config().validate()?;
        self.validate_training()
    }

    /// Check everything except the graph-generation fields.
    pub fn validate_training(&self) -> Result<()> {
        if self.dim_embedding == Some(0) || self.hidden_dim == Some(0) {
            return Err(Error::InvalidConfig(
                "dim_embedding and hidden_dim must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout {} not in [0, 1)",
                self.dropout
            )));
        }
        if self.number_classes != 1 {
            return Err(Error::InvalidConfig(format!(
                "number_classes must be 1 for MIS, got {}",
                self.number_classes
            )));
        }
        if !(self.prob_threshold > 0.0 && self.prob_threshold < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "prob_threshold {} not in (0, 1)",
                self.prob_threshold
            )));
        }
        if !(self.tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance {} must be non-negative",
                self.tolerance
            )));
        }
        if self.patience == 0 {
            return Err(Error::InvalidConfig("patience must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }
        if !(self.weight_decay >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weight_decay {} must be non-negative",
                self.weight_decay
            )));
        }
        if !(self.penalty > 1.0 && self.penalty.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "penalty {} must exceed the node reward magnitude 1",
                self.penalty
            )));
        }
        Ok(())
    }

    /// Graph generator parameters.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            n: self.n,
            graph_type: self.graph_type,
            degree: self.degree,
            probability: self.probability.unwrap_or(f64::NAN),
            seed: self.random_seed,
        }
    }

    /// Network and training-loop parameters for a graph with `self.n` nodes.
    pub fn hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters_for(self.n)
    }

    /// Network and training-loop parameters for a graph with `n` nodes.
    ///
    /// Used when the graph was loaded rather than generated.
    pub fn hyperparameters_for(&self, n: usize) -> Hyperparameters {
        let dim_embedding = self
            .dim_embedding
            .unwrap_or_else(|| ((n as f64).sqrt().round() as usize).max(1));
        let hidden_dim = self.hidden_dim.unwrap_or((dim_embedding / 2).max(1));

        Hyperparameters {
            dim_embedding,
            hidden_dim,
            dropout: self.dropout,
            number_classes: self.number_classes,
            prob_threshold: self.prob_threshold,
            number_epochs: self.number_epochs,
            tolerance: self.tolerance,
            patience: self.patience,
            log_every: self.log_every,
        }
    }

    /// Optimizer parameters.
    pub fn optimizer_params(&self) -> OptimizerParams {
        OptimizerParams {
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
        }
    }
}

/// Resolved network and training-loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub dim_embedding: usize,
    pub hidden_dim: usize,
    pub dropout: f32,
    pub number_classes: usize,
    pub prob_threshold: f32,
    pub number_epochs: usize,
    pub tolerance: f32,
    pub patience: usize,
    pub log_every: usize,
}

/// Optimizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerParams {
    pub learning_rate: f64,
    pub weight_decay: f64,
}
