//! Message-passing convolution for the relaxation network.
//!
//! [`GCNConv`] follows the graph convolution of Kipf & Welling:
//!
//! ```text
//! H' = Â H W + b,    Â = D^{-1/2} A D^{-1/2}
//! ```
//!
//! Each node's new representation is a degree-normalised sum over its
//! neighbors only, so adjacent nodes see different inputs and can be pushed
//! to opposite probabilities. [`normalized_adjacency`] builds `Â` once per
//! graph; it is fixed for a run and shared by every layer.

use crate::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear_b, Linear, Module, VarBuilder};
use misrelax_core::Graph;

/// Graph Convolutional Network layer.
///
/// # Reference
///
/// Kipf & Welling, "Semi-Supervised Classification with Graph Convolutional
/// Networks", ICLR 2017.
pub struct GCNConv {
    linear: Linear,
    out_features: usize,
}

impl GCNConv {
    /// Create a new GCN layer.
    ///
    /// # Arguments
    /// - `in_features`: Input feature dimension
    /// - `out_features`: Output feature dimension
    /// - `bias`: Whether to include bias term
    /// - `vb`: Variable builder for parameter initialization
    pub fn new(
        in_features: usize,
        out_features: usize,
        bias: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let linear = linear_b(in_features, out_features, bias, vb)?;
        Ok(Self {
            linear,
            out_features,
        })
    }

    /// Output feature dimension.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// - `x`: Node features (N x in_features)
    /// - `adj`: Normalized adjacency matrix (N x N)
    ///
    /// # Returns
    /// - Node embeddings (N x out_features)
    pub fn forward(&self, x: &Tensor, adj: &Tensor) -> Result<Tensor> {
        // Aggregate first, then transform: (Â X) W
        let agg = adj.matmul(x)?;
        Ok(self.linear.forward(&agg)?)
    }
}

/// Symmetric-normalised adjacency, `D^{-1/2} A D^{-1/2}`.
///
/// No self-loops except on isolated nodes, which get a weight-1 loop so they
/// keep their own features instead of aggregating to zero.
pub fn normalized_adjacency(graph: &Graph, dtype: DType, device: &Device) -> Result<Tensor> {
    let n = graph.node_count();
    let inv_sqrt: Vec<f32> = (0..n)
        .map(|u| 1.0 / (graph.degree(u).max(1) as f32).sqrt())
        .collect();

    let mut dense = vec![0.0f32; n * n];
    for u in (0..n).filter(|&u| graph.degree(u) == 0) {
        dense[u * n + u] = 1.0;
    }
    for (u, v) in graph.edges() {
        let w = inv_sqrt[u] * inv_sqrt[v];
        dense[u * n + v] = w;
        dense[v * n + u] = w;
    }

    Ok(Tensor::from_vec(dense, (n, n), device)?.to_dtype(dtype)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    #[test]
    fn test_gcn_forward_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let gcn = GCNConv::new(16, 8, true, vb).unwrap();

        let x = Tensor::randn(0f32, 1f32, (10, 16), &device).unwrap();
        let adj = Tensor::eye(10, DType::F32, &device).unwrap();

        let out = gcn.forward(&x, &adj).unwrap();
        assert_eq!(out.dims(), &[10, 8]);
        assert_eq!(gcn.out_features(), 8);
    }

    #[test]
    fn test_normalized_adjacency_path() {
        // 0 - 1 - 2: degrees 1, 2, 1
        let g = Graph::from_edges(3, [(0, 1), (1, 2)]).unwrap();
        let adj = normalized_adjacency(&g, DType::F32, &Device::Cpu).unwrap();
        let a: Vec<Vec<f32>> = adj.to_vec2().unwrap();

        assert!((a[0][1] - 1.0 / 2f32.sqrt()).abs() < 1e-6);
        assert_eq!(a[0][1], a[1][0]);
        assert_eq!(a[1][2], a[0][1]);
        assert_eq!(a[0][2], 0.0);
        for u in 0..3 {
            assert_eq!(a[u][u], 0.0, "node {} has a self-loop", u);
        }
    }

    #[test]
    fn test_adjacent_nodes_aggregate_different_features() {
        // On an edge each endpoint only sees the other one.
        let g = Graph::from_edges(2, [(0, 1)]).unwrap();
        let adj = normalized_adjacency(&g, DType::F32, &Device::Cpu).unwrap();
        let x = Tensor::new(&[[1.0f32], [-1.0]], &Device::Cpu).unwrap();
        let agg: Vec<Vec<f32>> = adj.matmul(&x).unwrap().to_vec2().unwrap();
        assert_eq!(agg, vec![vec![-1.0], vec![1.0]]);
    }

    #[test]
    fn test_normalized_adjacency_mixed_isolated() {
        // node 2 is isolated and keeps a self-loop; nodes 0, 1 do not
        let g = Graph::from_edges(3, [(0, 1)]).unwrap();
        let adj = normalized_adjacency(&g, DType::F32, &Device::Cpu).unwrap();
        let a: Vec<Vec<f32>> = adj.to_vec2().unwrap();
        assert_eq!(
            a,
            vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0]
            ]
        );
    }

    #[test]
    fn test_normalized_adjacency_isolated_node() {
        let g = Graph::empty(2);
        let adj = normalized_adjacency(&g, DType::F32, &Device::Cpu).unwrap();
        let a: Vec<Vec<f32>> = adj.to_vec2().unwrap();
        assert_eq!(a, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
