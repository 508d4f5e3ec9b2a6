//! Error types for misrelax-core.

use thiserror::Error;

/// Error type for graph construction, generation and QUBO formulation.
#[derive(Error, Debug)]
pub enum Error {
    /// Generator parameters that cannot produce a simple graph.
    #[error("Invalid graph parameters: {0}")]
    InvalidGraphParams(String),

    /// Edge endpoint outside the dense node range.
    #[error("Node {node} out of range for graph with {n} nodes")]
    NodeOutOfRange { node: usize, n: usize },

    /// Self-loops are not allowed in simple graphs.
    #[error("Self-loop on node {0}")]
    SelfLoop(usize),

    /// Edge penalty must dominate the per-node inclusion reward.
    #[error("QUBO penalty must be strictly greater than 1, got {0}")]
    InvalidPenalty(f64),

    /// Bitstring length does not match the graph.
    #[error("Bitstring has {got} entries, graph has {expected} nodes")]
    LengthMismatch { expected: usize, got: usize },

    /// Graph exceeds what an exact solver accepts.
    #[error("Graph with {n} nodes exceeds exact solver limit of {max}")]
    TooLarge { n: usize, max: usize },

    /// Edge-list parse error.
    #[error("Failed to parse edge list: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for misrelax-core operations.
pub type Result<T> = std::result::Result<T, Error>;
