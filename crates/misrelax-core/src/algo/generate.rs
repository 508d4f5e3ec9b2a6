//! Seeded random graph generation.
//!
//! Two families, selected by [`GraphType`]:
//!
//! - **Regular**: every node has degree exactly `d`. Built with the pairing
//!   model (Steger & Wormald 1999): shuffle `n·d` stubs, pair them up, keep
//!   pairs that form new simple edges and re-pair the leftovers. A round that
//!   leaves no usable pair restarts from scratch.
//! - **Probabilistic**: `G(n, p)`, each of the `n(n-1)/2` edges present
//!   independently with probability `p`.
//!
//! All randomness comes from a `ChaCha8Rng` seeded with the config's seed,
//! so the same config always yields the same graph.

use crate::{Error, Graph, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Restarts allowed before the regular generator gives up.
const MAX_REGULAR_ATTEMPTS: usize = 1000;

/// Random graph family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    /// Fixed-degree regular graph.
    #[default]
    Regular,
    /// Erdős–Rényi `G(n, p)`.
    Probabilistic,
}

/// Random graph generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of nodes.
    pub n: usize,
    /// Graph family.
    pub graph_type: GraphType,
    /// Node degree (regular graphs).
    pub degree: usize,
    /// Edge probability (probabilistic graphs).
    pub probability: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n: 100,
            graph_type: GraphType::Regular,
            degree: 3,
            probability: 0.05,
            seed: 1,
        }
    }
}

impl GeneratorConfig {
    /// `d`-regular graph on `n` nodes.
    pub fn regular(n: usize, degree: usize, seed: u64) -> Self {
        Self {
            n,
            graph_type: GraphType::Regular,
            degree,
            seed,
            ..Default::default()
        }
    }

    /// `G(n, p)` graph.
    pub fn probabilistic(n: usize, probability: f64, seed: u64) -> Self {
        Self {
            n,
            graph_type: GraphType::Probabilistic,
            probability,
            seed,
            ..Default::default()
        }
    }

    /// Check that the parameters describe a realisable simple graph.
    pub fn validate(&self) -> Result<()> {
        match self.graph_type {
            GraphType::Regular => {
                if self.n > 0 && self.degree >= self.n {
                    return Err(Error::InvalidGraphParams(format!(
                        "degree {} must be less than n = {}",
                        self.degree, self.n
                    )));
                }
                if self.n == 0 && self.degree > 0 {
                    return Err(Error::InvalidGraphParams(
                        "empty graph cannot have positive degree".into(),
                    ));
                }
                if (self.n * self.degree) % 2 != 0 {
                    return Err(Error::InvalidGraphParams(format!(
                        "n * d must be even, got {} * {}",
                        self.n, self.degree
                    )));
                }
            }
            GraphType::Probabilistic => {
                if !(0.0..=1.0).contains(&self.probability) {
                    return Err(Error::InvalidGraphParams(format!(
                        "probability {} not in [0, 1]",
                        self.probability
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Generate a graph from `config`.
pub fn generate(config: &GeneratorConfig) -> Result<Graph> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let graph = match config.graph_type {
        GraphType::Regular => random_regular(config.n, config.degree, &mut rng)?,
        GraphType::Probabilistic => gnp(config.n, config.probability, &mut rng)?,
    };

    tracing::debug!(
        n = graph.node_count(),
        edges = graph.edge_count(),
        graph_type = ?config.graph_type,
        seed = config.seed,
        "generated graph"
    );
    Ok(graph)
}

fn random_regular<R: Rng>(n: usize, d: usize, rng: &mut R) -> Result<Graph> {
    if d == 0 {
        return Ok(Graph::empty(n));
    }

    for _ in 0..MAX_REGULAR_ATTEMPTS {
        if let Some(edges) = try_pairing(n, d, rng) {
            let mut edges: Vec<_> = edges.into_iter().collect();
            edges.sort_unstable();
            return Graph::from_edges(n, edges);
        }
    }

    Err(Error::InvalidGraphParams(format!(
        "failed to build a {}-regular graph on {} nodes after {} attempts",
        d, n, MAX_REGULAR_ATTEMPTS
    )))
}

/// One pairing-model attempt; `None` when the leftover stubs cannot be
/// paired into new simple edges.
fn try_pairing<R: Rng>(n: usize, d: usize, rng: &mut R) -> Option<HashSet<(usize, usize)>> {
    let mut edges = HashSet::with_capacity(n * d / 2);
    let mut stubs: Vec<usize> = (0..n).flat_map(|u| std::iter::repeat(u).take(d)).collect();

    while !stubs.is_empty() {
        // BTreeMap keeps leftover order independent of hashing.
        let mut leftover: BTreeMap<usize, usize> = BTreeMap::new();
        stubs.shuffle(rng);

        for pair in stubs.chunks_exact(2) {
            let (u, v) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            if u != v && edges.insert((u, v)) {
                continue;
            }
            *leftover.entry(u).or_insert(0) += 1;
            *leftover.entry(v).or_insert(0) += 1;
        }

        if !has_free_pair(&edges, &leftover) {
            return None;
        }

        stubs = leftover
            .into_iter()
            .flat_map(|(u, count)| std::iter::repeat(u).take(count))
            .collect();
    }

    Some(edges)
}

fn has_free_pair(edges: &HashSet<(usize, usize)>, leftover: &BTreeMap<usize, usize>) -> bool {
    if leftover.is_empty() {
        return true;
    }
    let nodes: Vec<usize> = leftover.keys().copied().collect();
    for (i, &u) in nodes.iter().enumerate() {
        for &v in &nodes[i + 1..] {
            if !edges.contains(&(u, v)) {
                return true;
            }
        }
    }
    false
}

fn gnp<R: Rng>(n: usize, p: f64, rng: &mut R) -> Result<Graph> {
    let mut graph = Graph::empty(n);
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random::<f64>() < p {
                graph.add_edge(u, v)?;
            }
        }
    }
    Ok(graph)
}
