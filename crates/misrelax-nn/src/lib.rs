// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]

//! Unsupervised GNN relaxation of Maximum Independent Set.
//!
//! A graph convolutional network maps learned node embeddings to one
//! inclusion probability per node. Training minimises the QUBO cost of those
//! probabilities directly, with no labels; thresholding turns the result
//! back into a discrete independent set.
//!
//! # Modules
//!
//! - [`conv`]: GCN layer and normalised adjacency
//! - [`network`]: the relaxation network
//! - [`loss`]: `pᵀ Q p` and discrete bitstring cost
//! - [`factory`]: seeded network and optimizer construction
//! - [`trainer`]: training loop with early stopping and best-decode tracking
//! - [`pipeline`]: graph → trained network → decoded solution
//! - [`config`]: run configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use misrelax_core::{generate, GeneratorConfig};
//! use misrelax_nn::{solve, RunConfig};
//!
//! let graph = generate(&GeneratorConfig::regular(100, 3, 1))?;
//! let config = RunConfig::default().with_learning_rate(1e-3);
//!
//! let run = solve(&graph, &config)?;
//! println!("size {} with {} violations", run.best.solution_size, run.best.violations);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod conv;
pub mod error;
pub mod factory;
pub mod loss;
pub mod network;
pub mod pipeline;
pub mod trainer;

pub use config::{Hyperparameters, OptimizerParams, RunConfig};
pub use error::{Error, Result};
pub use factory::{build_model, Model};
pub use network::RelaxationNet;
pub use pipeline::{generate_and_solve, solve, solve_on, MisRun};
pub use trainer::{train, TrainStatus, TrainingOutcome, TrainingState};
