//! Classical Maximum Independent Set solvers.
//!
//! These exist to put the neural solver's answers in context:
//!
//! - [`greedy_mis`]: minimum-degree greedy. Repeatedly takes the node with
//!   the fewest remaining neighbors and deletes its closed neighborhood.
//!   Always independent, usually close to optimal on sparse random graphs.
//! - [`exact_mis`]: branch-and-bound over `u64` bitsets, for graphs with at
//!   most [`EXACT_MAX_NODES`] nodes. Nodes with at most one remaining
//!   neighbor are taken without branching, and a greedy clique cover of the
//!   remaining candidates bounds how many more nodes can still be added.
//!
//! Both report violations through the same counter used for decoded
//! bitstrings, so a nonzero count would point at a solver bug.

use crate::decode::{validate_set, DEFAULT_PAIR_BATCH};
use crate::{Error, Graph, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Largest graph [`exact_mis`] accepts.
pub const EXACT_MAX_NODES: usize = 64;

/// Which classical solver to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSolver {
    /// Minimum-degree greedy.
    #[default]
    Greedy,
    /// Exact branch-and-bound.
    Exact,
}

impl ReferenceSolver {
    /// Run the solver on `graph`.
    pub fn solve(self, graph: &Graph) -> Result<ReferenceSolution> {
        match self {
            Self::Greedy => Ok(greedy_mis(graph)),
            Self::Exact => exact_mis(graph),
        }
    }
}

/// Output of a classical solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSolution {
    /// Chosen nodes.
    pub independent_set: BTreeSet<usize>,
    /// Number of chosen nodes.
    pub size: usize,
    /// Violated edges (zero for a correct solver).
    pub violations: usize,
    /// Wall-clock solve time.
    pub elapsed: Duration,
}

impl ReferenceSolution {
    fn from_set(set: BTreeSet<usize>, graph: &Graph, elapsed: Duration) -> Self {
        let decoded = validate_set(set, graph, DEFAULT_PAIR_BATCH);
        Self {
            size: decoded.solution_size,
            independent_set: decoded.independent_set,
            violations: decoded.violations,
            elapsed,
        }
    }
}

/// Minimum-degree greedy independent set.
#[must_use]
pub fn greedy_mis(graph: &Graph) -> ReferenceSolution {
    let start = Instant::now();
    let n = graph.node_count();

    let mut degree: Vec<usize> = (0..n).map(|u| graph.degree(u)).collect();
    let mut alive = vec![true; n];
    let mut queue: BTreeSet<(usize, usize)> = (0..n).map(|u| (degree[u], u)).collect();
    let mut chosen = BTreeSet::new();

    while let Some(&(_, u)) = queue.first() {
        chosen.insert(u);

        let mut removed = vec![u];
        removed.extend(graph.neighbors(u).filter(|&w| alive[w]));
        for &r in &removed {
            alive[r] = false;
            queue.remove(&(degree[r], r));
        }

        for &r in &removed {
            for w in graph.neighbors(r) {
                if alive[w] {
                    queue.remove(&(degree[w], w));
                    degree[w] -= 1;
                    queue.insert((degree[w], w));
                }
            }
        }
    }

    ReferenceSolution::from_set(chosen, graph, start.elapsed())
}

/// Exact maximum independent set by branch-and-bound.
pub fn exact_mis(graph: &Graph) -> Result<ReferenceSolution> {
    let n = graph.node_count();
    if n > EXACT_MAX_NODES {
        return Err(Error::TooLarge {
            n,
            max: EXACT_MAX_NODES,
        });
    }
    let start = Instant::now();

    let mut adjacency = vec![0u64; n];
    for (u, v) in graph.edges() {
        adjacency[u] |= 1 << v;
        adjacency[v] |= 1 << u;
    }

    let all = if n == 0 { 0 } else { u64::MAX >> (64 - n) };
    // Seed the bound with the greedy answer.
    let greedy = greedy_mis(graph);
    let mut best = Best {
        size: greedy.size as u32,
        set: greedy.independent_set.iter().fold(0u64, |m, &u| m | (1 << u)),
    };
    branch(all, 0, 0, &adjacency, &mut best);

    let set: BTreeSet<usize> = (0..n).filter(|&u| best.set & (1 << u) != 0).collect();
    Ok(ReferenceSolution::from_set(set, graph, start.elapsed()))
}

struct Best {
    size: u32,
    set: u64,
}

fn branch(
    mut candidates: u64,
    mut chosen: u64,
    mut size: u32,
    adjacency: &[u64],
    best: &mut Best,
) {
    // A node with no candidate neighbor, or exactly one, belongs to some
    // maximum independent set of what remains.
    loop {
        let mut reduced = false;
        let mut rest = candidates;
        while rest != 0 {
            let v = rest.trailing_zeros() as usize;
            rest &= rest - 1;
            let bit = 1u64 << v;
            if candidates & bit == 0 {
                continue;
            }
            let neighbors = adjacency[v] & candidates;
            if neighbors.count_ones() <= 1 {
                chosen |= bit;
                size += 1;
                candidates &= !(bit | neighbors);
                reduced = true;
            }
        }
        if !reduced {
            break;
        }
    }

    if candidates == 0 {
        if size > best.size {
            best.size = size;
            best.set = chosen;
        }
        return;
    }
    if size + clique_cover(candidates, adjacency) <= best.size {
        return;
    }

    // Branch on the candidate with the most candidate neighbors.
    let mut pivot = candidates.trailing_zeros() as usize;
    let mut pivot_degree = 0;
    let mut rest = candidates;
    while rest != 0 {
        let v = rest.trailing_zeros() as usize;
        rest &= rest - 1;
        let d = (adjacency[v] & candidates).count_ones();
        if d > pivot_degree {
            pivot = v;
            pivot_degree = d;
        }
    }

    let bit = 1u64 << pivot;
    branch(
        candidates & !bit & !adjacency[pivot],
        chosen | bit,
        size + 1,
        adjacency,
        best,
    );
    branch(candidates & !bit, chosen, size, adjacency, best);
}

/// Number of cliques in a greedy clique cover of `candidates`.
///
/// An independent set holds at most one node per clique, so this bounds how
/// many candidates can still be chosen.
fn clique_cover(candidates: u64, adjacency: &[u64]) -> u32 {
    let mut rest = candidates;
    let mut cliques = 0;
    while rest != 0 {
        let v = rest.trailing_zeros() as usize;
        rest &= !(1u64 << v);
        let mut extend = adjacency[v] & rest;
        while extend != 0 {
            let w = extend.trailing_zeros() as usize;
            rest &= !(1u64 << w);
            extend &= adjacency[w];
        }
        cliques += 1;
    }
    cliques
}
