//! Bitstring decoding and independent-set validation.
//!
//! Turning a probability vector into an answer is two steps:
//!
//! 1. [`threshold`] maps each probability to a bit.
//! 2. [`decode`] collects the included nodes and counts violated edges.
//!
//! Violation counting walks the `k(k-1)/2` pairs of included nodes in
//! fixed-size batches ([`PairBatches`]) so that peak memory is bounded by the
//! batch size rather than by `k²`. The same counter validates GNN output and
//! classical reference solutions.

use crate::{Error, Graph, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default number of node pairs examined per batch.
pub const DEFAULT_PAIR_BATCH: usize = 100_000;

/// Threshold probabilities into a 0/1 bitstring (`p >= threshold` → 1).
pub fn threshold(probs: &[f32], threshold: f32) -> Vec<u8> {
    probs.iter().map(|&p| u8::from(p >= threshold)).collect()
}

/// Lazy, restartable sequence of fixed-size batches over all unordered
/// pairs of a node set.
///
/// Each call to [`PairBatches::iter`] starts from the first pair again.
#[derive(Debug, Clone, Copy)]
pub struct PairBatches<'a> {
    nodes: &'a [usize],
    batch_size: usize,
}

impl<'a> PairBatches<'a> {
    /// Batches over pairs of `nodes`; a `batch_size` of 0 is treated as 1.
    pub fn new(nodes: &'a [usize], batch_size: usize) -> Self {
        Self {
            nodes,
            batch_size: batch_size.max(1),
        }
    }

    /// Total number of pairs across all batches.
    pub fn total_pairs(&self) -> usize {
        let k = self.nodes.len();
        k * k.saturating_sub(1) / 2
    }

    /// Iterate batches from the beginning.
    pub fn iter(&self) -> PairBatchIter<'a> {
        PairBatchIter {
            nodes: self.nodes,
            batch_size: self.batch_size,
            i: 0,
            j: 1,
        }
    }
}

impl<'a> IntoIterator for &PairBatches<'a> {
    type Item = Vec<(usize, usize)>;
    type IntoIter = PairBatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator state for [`PairBatches`].
#[derive(Debug, Clone)]
pub struct PairBatchIter<'a> {
    nodes: &'a [usize],
    batch_size: usize,
    i: usize,
    j: usize,
}

impl Iterator for PairBatchIter<'_> {
    type Item = Vec<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.nodes.len();
        let mut batch = Vec::with_capacity(self.batch_size.min(k * k / 2 + 1));

        while batch.len() < self.batch_size && self.i + 1 < k {
            batch.push((self.nodes[self.i], self.nodes[self.j]));
            self.j += 1;
            if self.j == k {
                self.i += 1;
                self.j = self.i + 1;
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Count edges of `graph` with both endpoints in `set`, scanning pairs in
/// batches of `batch_size`.
pub fn count_violations(graph: &Graph, set: &BTreeSet<usize>, batch_size: usize) -> usize {
    let nodes: Vec<usize> = set.iter().copied().collect();
    PairBatches::new(&nodes, batch_size)
        .iter()
        .map(|batch| {
            batch
                .iter()
                .filter(|&&(u, v)| graph.has_edge(u, v))
                .count()
        })
        .sum()
}

/// Reference violation count that materialises every pair at once.
pub fn count_violations_naive(graph: &Graph, set: &BTreeSet<usize>) -> usize {
    let nodes: Vec<usize> = set.iter().copied().collect();
    let mut pairs = Vec::new();
    for (i, &u) in nodes.iter().enumerate() {
        for &v in &nodes[i + 1..] {
            pairs.push((u, v));
        }
    }
    pairs.iter().filter(|&&(u, v)| graph.has_edge(u, v)).count()
}

/// A decoded candidate solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    /// Number of included nodes.
    pub solution_size: usize,
    /// Included node indices.
    pub independent_set: BTreeSet<usize>,
    /// Edges with both endpoints included.
    pub violations: usize,
}

impl Decoded {
    /// Whether the set is a valid independent set.
    pub fn is_independent(&self) -> bool {
        self.violations == 0
    }
}

/// Decode a bitstring against `graph` using [`DEFAULT_PAIR_BATCH`].
pub fn decode(bits: &[u8], graph: &Graph) -> Result<Decoded> {
    decode_with_batch(bits, graph, DEFAULT_PAIR_BATCH)
}

/// Decode a bitstring with an explicit pair batch size.
pub fn decode_with_batch(bits: &[u8], graph: &Graph, batch_size: usize) -> Result<Decoded> {
    if bits.len() != graph.node_count() {
        return Err(Error::LengthMismatch {
            expected: graph.node_count(),
            got: bits.len(),
        });
    }

    let independent_set: BTreeSet<usize> = bits
        .iter()
        .enumerate()
        .filter(|(_, &b)| b != 0)
        .map(|(i, _)| i)
        .collect();

    Ok(validate_set(independent_set, graph, batch_size))
}

/// Validate an explicit node set (e.g. from a classical solver).
pub fn validate_set(set: BTreeSet<usize>, graph: &Graph, batch_size: usize) -> Decoded {
    let violations = count_violations(graph, &set, batch_size);
    Decoded {
        solution_size: set.len(),
        independent_set: set,
        violations,
    }
}
