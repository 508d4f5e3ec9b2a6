//! Maximum Independent Set by unsupervised graph-neural relaxation.
//!
//! `misrelax` poses MIS as a QUBO problem, relaxes the binary variables to
//! per-node probabilities produced by a two-layer graph convolutional
//! network, and minimizes the relaxed cost by gradient descent:
//!
//! - Generate random regular or `G(n, p)` graphs, or load edge lists
//! - Build the MIS QUBO matrix with a configurable edge penalty
//! - Train a GCN against `pᵀQp` with early stopping
//! - Decode the best bitstring seen and count edge violations in batches
//! - Compare against classical greedy and exact solvers
//!
//! # Crate Structure
//!
//! - [`misrelax_core`] - Graph, QUBO matrix, decoding, generators, reference solvers
//! - [`misrelax_nn`] - GCN layers, relaxed loss, training loop, run pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use misrelax::{generate_and_solve, RunConfig};
//!
//! let config = RunConfig::default().with_n(50).with_degree(3).with_seed(1);
//! let (graph, run) = generate_and_solve(&config)?;
//!
//! println!(
//!     "{} nodes, {} edges: independent set of size {} ({} violations)",
//!     graph.node_count(),
//!     graph.edge_count(),
//!     run.best.solution_size,
//!     run.best.violations,
//! );
//! # Ok::<(), misrelax::NnError>(())
//! ```

// Re-export core types
pub use misrelax_core::{
    exact_mis, generate, greedy_mis, Decoded, Error as CoreError, GeneratorConfig, Graph,
    GraphType, QuboMatrix, ReferenceSolution, ReferenceSolver, Result as CoreResult,
};

// Re-export petgraph for advanced graph operations
pub use misrelax_core::petgraph;

pub use misrelax_nn::{
    generate_and_solve, solve, solve_on, Error as NnError, Hyperparameters, MisRun,
    OptimizerParams, Result as NnResult, RunConfig, TrainStatus,
};

/// Thresholding, decoding and batched violation counting.
pub mod decode {
    pub use misrelax_core::decode::*;
}

/// Graph generators and classical reference solvers.
pub mod algo {
    pub use misrelax_core::algo::*;
}

/// Network, loss and training loop.
pub mod nn {
    pub use misrelax_nn::*;
}
