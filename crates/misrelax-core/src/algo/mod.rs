//! Graph algorithms that feed or check the neural solver.

/// Seeded random graph generators (regular, Erdős–Rényi).
pub mod generate;

/// Classical MIS solvers used as a comparison baseline.
pub mod reference;
