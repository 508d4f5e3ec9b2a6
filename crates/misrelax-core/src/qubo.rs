//! QUBO formulation of Maximum Independent Set.
//!
//! For a graph `G = (V, E)` the MIS cost over binary `x` is
//!
//! ```text
//! H(x) = -Σ_{u ∈ V} x_u + P · Σ_{(u,v) ∈ E} x_u x_v
//! ```
//!
//! Every included node earns `-1`; every edge with both endpoints included
//! costs `P`. With `P > 1` a violated edge can never be paid for by the
//! extra inclusion it buys, so minima of `H` are independent sets.
//!
//! [`QuboMatrix`] keeps the sparse upper-triangular coefficients: one diagonal
//! entry per node and one off-diagonal entry per edge. [`QuboMatrix::to_dense`]
//! spreads each edge coefficient over `(u, v)` and `(v, u)` so that the dense
//! matrix is symmetric and `xᵀ Q x == H(x)`.

use crate::{Error, Graph, Result};
use std::collections::BTreeMap;

/// Default edge penalty.
pub const DEFAULT_PENALTY: f64 = 2.0;

/// Diagonal reward per included node.
pub const NODE_REWARD: f64 = -1.0;

/// Sparse QUBO coefficients keyed by `(row, col)` with `row <= col`.
///
/// Absent keys read as zero. Lookups are symmetric: `get(u, v) == get(v, u)`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    n: usize,
    penalty: f64,
    entries: BTreeMap<(usize, usize), f64>,
}

impl QuboMatrix {
    /// Build the MIS QUBO for `graph`.
    ///
    /// Diagonal entries are set (not accumulated) to [`NODE_REWARD`]; each
    /// edge contributes `penalty` once. Graphs without edges or nodes are
    /// valid inputs.
    pub fn for_mis(graph: &Graph, penalty: f64) -> Result<Self> {
        if !penalty.is_finite() || penalty <= -NODE_REWARD {
            return Err(Error::InvalidPenalty(penalty));
        }

        let mut entries = BTreeMap::new();
        for (u, v) in graph.edges() {
            *entries.entry((u.min(v), u.max(v))).or_insert(0.0) += penalty;
        }
        for u in 0..graph.node_count() {
            entries.insert((u, u), NODE_REWARD);
        }

        Ok(Self {
            n: graph.node_count(),
            penalty,
            entries,
        })
    }

    /// Matrix dimension (number of graph nodes).
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Edge penalty this matrix was built with.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Coefficient for the pair `{u, v}`; zero when absent.
    pub fn get(&self, u: usize, v: usize) -> f64 {
        self.entries
            .get(&(u.min(v), u.max(v)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of stored (non-implicit) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Iterate stored entries as `((row, col), value)` with `row <= col`.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// Dense symmetric row-major `n × n` materialisation.
    ///
    /// Off-diagonal coefficients are halved across `(u, v)` and `(v, u)`.
    pub fn to_dense(&self) -> Vec<f32> {
        let n = self.n;
        let mut dense = vec![0.0f32; n * n];
        for (&(u, v), &value) in &self.entries {
            if u == v {
                dense[u * n + u] = value as f32;
            } else {
                let half = (value / 2.0) as f32;
                dense[u * n + v] += half;
                dense[v * n + u] += half;
            }
        }
        dense
    }

    /// Discrete cost `H(x)` of a 0/1 assignment.
    pub fn energy(&self, bits: &[u8]) -> Result<f64> {
        if bits.len() != self.n {
            return Err(Error::LengthMismatch {
                expected: self.n,
                got: bits.len(),
            });
        }
        let cost = self
            .entries
            .iter()
            .filter(|((u, v), _)| bits[*u] != 0 && bits[*v] != 0)
            .map(|(_, value)| *value)
            .sum();
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle4() -> Graph {
        Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn test_entries_for_cycle() {
        let q = QuboMatrix::for_mis(&cycle4(), 2.0).unwrap();
        assert_eq!(q.nnz(), 8);
        for u in 0..4 {
            assert_eq!(q.get(u, u), -1.0);
        }
        assert_eq!(q.get(0, 1), 2.0);
        assert_eq!(q.get(1, 0), 2.0);
        assert_eq!(q.get(0, 3), 2.0);
        assert_eq!(q.get(0, 2), 0.0);
    }

    #[test]
    fn test_absent_keys_are_zero() {
        let q = QuboMatrix::for_mis(&Graph::empty(3), 2.0).unwrap();
        assert_eq!(q.get(0, 1), 0.0);
        assert_eq!(q.get(2, 0), 0.0);
        assert_eq!(q.get(7, 9), 0.0);
    }

    #[test]
    fn test_isolated_nodes_get_reward() {
        let g = Graph::from_edges(3, [(0, 1)]).unwrap();
        let q = QuboMatrix::for_mis(&g, 2.0).unwrap();
        assert_eq!(q.get(2, 2), -1.0);
    }

    #[test]
    fn test_dense_is_symmetric_and_matches_energy() {
        let q = QuboMatrix::for_mis(&cycle4(), 2.0).unwrap();
        let dense = q.to_dense();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(dense[i * 4 + j], dense[j * 4 + i]);
            }
        }

        let bits = [1u8, 1, 0, 1];
        let x: Vec<f32> = bits.iter().map(|&b| b as f32).collect();
        let mut quad = 0.0f32;
        for i in 0..4 {
            for j in 0..4 {
                quad += x[i] * dense[i * 4 + j] * x[j];
            }
        }
        // 3 nodes, 2 violated edges: -3 + 2*2
        assert_eq!(q.energy(&bits).unwrap(), 1.0);
        assert!((quad - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_energy_of_independent_set() {
        let q = QuboMatrix::for_mis(&cycle4(), 2.0).unwrap();
        assert_eq!(q.energy(&[1, 0, 1, 0]).unwrap(), -2.0);
        assert_eq!(q.energy(&[0, 0, 0, 0]).unwrap(), 0.0);
        assert_eq!(q.energy(&[1, 1, 1, 1]).unwrap(), 4.0);
    }

    #[test]
    fn test_rejects_weak_penalty() {
        let g = cycle4();
        assert!(matches!(
            QuboMatrix::for_mis(&g, 1.0),
            Err(Error::InvalidPenalty(_))
        ));
        assert!(QuboMatrix::for_mis(&g, f64::NAN).is_err());
    }

    #[test]
    fn test_energy_length_mismatch() {
        let q = QuboMatrix::for_mis(&cycle4(), 2.0).unwrap();
        assert!(matches!(
            q.energy(&[1, 0]),
            Err(Error::LengthMismatch { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_zero_node_graph() {
        let q = QuboMatrix::for_mis(&Graph::empty(0), DEFAULT_PENALTY).unwrap();
        assert_eq!(q.dim(), 0);
        assert!(q.to_dense().is_empty());
        assert_eq!(q.energy(&[]).unwrap(), 0.0);
    }
}
