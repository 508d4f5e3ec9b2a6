use crate::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// An unweighted, undirected simple graph over the dense node range `[0, n)`.
///
/// Uses petgraph's undirected graph internally. Edges are stored once, with
/// endpoints normalised so that `u < v`; duplicate edges are dropped at
/// construction and self-loops are rejected.
///
/// # Example
///
/// ```rust
/// use misrelax_core::Graph;
///
/// let cycle = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
///
/// assert_eq!(cycle.node_count(), 4);
/// assert_eq!(cycle.edge_count(), 4);
/// assert!(cycle.has_edge(0, 3));
/// ```
#[derive(Debug, Clone)]
pub struct Graph {
    graph: UnGraph<(), ()>,

    /// Normalised `(min, max)` edge pairs, for O(1) membership tests.
    edge_set: HashSet<(usize, usize)>,
}

impl Graph {
    /// Create a graph with `n` isolated nodes.
    pub fn empty(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, 0);
        for _ in 0..n {
            graph.add_node(());
        }
        Self {
            graph,
            edge_set: HashSet::new(),
        }
    }

    /// Build a graph from an edge list.
    ///
    /// Edges are undirected: `(u, v)` and `(v, u)` denote the same edge and
    /// the second occurrence is ignored.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut g = Self::empty(n);
        for (u, v) in edges {
            g.add_edge(u, v)?;
        }
        Ok(g)
    }

    /// Add an undirected edge. Returns `false` if it was already present.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<bool> {
        let n = self.node_count();
        for node in [u, v] {
            if node >= n {
                return Err(Error::NodeOutOfRange { node, n });
            }
        }
        if u == v {
            return Err(Error::SelfLoop(u));
        }
        let key = (u.min(v), u.max(v));
        if !self.edge_set.insert(key) {
            return Ok(false);
        }
        self.graph
            .add_edge(NodeIndex::new(key.0), NodeIndex::new(key.1), ());
        Ok(true)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of (undirected) edges.
    pub fn edge_count(&self) -> usize {
        self.edge_set.len()
    }

    /// Whether an edge joins `u` and `v`, in either orientation.
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edge_set.contains(&(u.min(v), u.max(v)))
    }

    /// Iterate over edges as normalised `(u, v)` pairs with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    /// Neighbors of `node`.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(node))
            .map(|idx| idx.index())
    }

    /// Degree of `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(node)).count()
    }

    /// The normalised edge set.
    pub fn edge_set(&self) -> &HashSet<(usize, usize)> {
        &self.edge_set
    }

    /// Get the underlying petgraph graph.
    pub fn as_petgraph(&self) -> &UnGraph<(), ()> {
        &self.graph
    }

    /// Load from an edge-list file.
    ///
    /// Exactly one `u v` pair per line. `#` starts a comment; a `# nodes <n>` header
    /// fixes the node count so isolated trailing nodes survive. Without a
    /// header, `n` is one past the largest endpoint.
    pub fn from_edge_list_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut declared: Option<usize> = None;
        let mut edges = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                let mut parts = comment.split_whitespace();
                if parts.next() == Some("nodes") {
                    let n = parts
                        .next()
                        .and_then(|s| s.parse::<usize>().ok())
                        .ok_or_else(|| {
                            Error::Parse(format!("line {}: bad node header", lineno + 1))
                        })?;
                    declared = Some(n);
                }
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let edge = match parts.as_slice() {
                [u, v] => u.parse::<usize>().ok().zip(v.parse::<usize>().ok()),
                _ => None,
            };
            let edge = edge
                .ok_or_else(|| Error::Parse(format!("line {}: expected `u v`", lineno + 1)))?;
            edges.push(edge);
        }

        let inferred = edges.iter().map(|&(u, v)| u.max(v) + 1).max().unwrap_or(0);
        let n = declared.unwrap_or(inferred);
        Self::from_edges(n, edges)
    }

    /// Save to an edge-list file (with a `# nodes <n>` header).
    pub fn to_edge_list_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "# nodes {}", self.node_count())?;
        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_unstable();
        for (u, v) in edges {
            writeln!(writer, "{} {}", u, v)?;
        }
        writer.flush()?;
        Ok(())
    }
}
