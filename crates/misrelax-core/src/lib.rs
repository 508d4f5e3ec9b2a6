// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]

//! Graph substrate for QUBO-relaxed Maximum Independent Set.
//!
//! This crate provides everything the neural solver needs that is not a
//! tensor:
//!
//! - [`Graph`] - an undirected simple graph over nodes `[0, n)`
//! - [`QuboMatrix`] - the sparse MIS cost matrix built from a graph
//! - [`decode`] - thresholding, decoding and batched violation counting
//! - [`algo::generate`] - seeded regular and `G(n, p)` generators
//! - [`algo::reference`] - classical greedy and exact MIS solvers
//!
//! # Example
//!
//! ```rust
//! use misrelax_core::{decode, Graph, QuboMatrix};
//!
//! let cycle = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
//! let qubo = QuboMatrix::for_mis(&cycle, 2.0).unwrap();
//!
//! let bits = [1, 0, 1, 0];
//! assert_eq!(qubo.energy(&bits).unwrap(), -2.0);
//!
//! let solution = decode::decode(&bits, &cycle).unwrap();
//! assert_eq!(solution.solution_size, 2);
//! assert_eq!(solution.violations, 0);
//! ```

pub mod algo;
pub mod decode;
mod error;
mod graph;
pub mod qubo;

pub use algo::generate::{generate, GeneratorConfig, GraphType};
pub use algo::reference::{exact_mis, greedy_mis, ReferenceSolution, ReferenceSolver};
pub use decode::Decoded;
pub use error::{Error, Result};
pub use graph::Graph;
pub use qubo::QuboMatrix;

// Re-export petgraph for advanced graph operations
pub use petgraph;
