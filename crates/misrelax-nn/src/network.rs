//! Relaxation network: learned node embeddings through two GCN layers.
//!
//! ```text
//! X (n × dim_embedding, trainable)
//!   → GCN → ReLU → dropout      (n × hidden_dim)
//!   → GCN → sigmoid             (n × 1)
//!   → p ∈ [0, 1]^n
//! ```
//!
//! The embedding table is a parameter like any layer weight; there is no
//! external node feature input.

use crate::config::Hyperparameters;
use crate::conv::GCNConv;
use crate::{Error, Result};
use candle_core::Tensor;
use candle_nn::VarBuilder;

/// GCN mapping learned node embeddings to per-node inclusion probabilities.
pub struct RelaxationNet {
    embedding: Tensor,
    conv1: GCNConv,
    conv2: GCNConv,
    dropout: f32,
}

impl RelaxationNet {
    /// Build the network for a graph with `n` nodes.
    ///
    /// Parameters are registered under `embedding`, `conv1.*` and `conv2.*`.
    pub fn new(n: usize, hp: &Hyperparameters, vb: VarBuilder) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidConfig("graph has no nodes".into()));
        }
        if hp.number_classes != 1 {
            return Err(Error::InvalidConfig(format!(
                "number_classes must be 1, got {}",
                hp.number_classes
            )));
        }

        let embedding = vb.get_with_hints(
            (n, hp.dim_embedding),
            "embedding",
            candle_nn::Init::Randn {
                mean: 0.0,
                stdev: 1.0,
            },
        )?;
        let conv1 = GCNConv::new(hp.dim_embedding, hp.hidden_dim, true, vb.pp("conv1"))?;
        let conv2 = GCNConv::new(hp.hidden_dim, hp.number_classes, true, vb.pp("conv2"))?;

        Ok(Self {
            embedding,
            conv1,
            conv2,
            dropout: hp.dropout,
        })
    }

    /// The trainable `[n, dim_embedding]` embedding table.
    pub fn embedding(&self) -> &Tensor {
        &self.embedding
    }

    /// Number of nodes the network was built for.
    pub fn num_nodes(&self) -> usize {
        self.embedding.dims()[0]
    }

    /// Forward pass producing a length-`n` probability vector.
    ///
    /// `train` enables dropout.
    pub fn forward(&self, adj: &Tensor, train: bool) -> Result<Tensor> {
        let h = self.conv1.forward(&self.embedding, adj)?.relu()?;
        let h = if train && self.dropout > 0.0 {
            candle_nn::ops::dropout(&h, self.dropout)?
        } else {
            h
        };
        let logits = self.conv2.forward(&h, adj)?;
        Ok(candle_nn::ops::sigmoid(&logits)?.squeeze(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::conv::normalized_adjacency;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;
    use misrelax_core::Graph;

    #[test]
    fn test_forward_shape_and_range() {
        let device = Device::Cpu;
        let g = Graph::from_edges(6, [(0, 1), (1, 2), (3, 4)]).unwrap();
        let hp = RunConfig::default().with_dims(4, 2).hyperparameters_for(6);

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = RelaxationNet::new(6, &hp, vb).unwrap();
        let adj = normalized_adjacency(&g, DType::F32, &device).unwrap();

        let probs = net.forward(&adj, false).unwrap();
        assert_eq!(probs.dims(), &[6]);
        for p in probs.to_vec1::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
        assert_eq!(net.num_nodes(), 6);
        assert_eq!(net.embedding().dims(), &[6, 4]);
    }

    #[test]
    fn test_parameters_registered() {
        let device = Device::Cpu;
        let hp = RunConfig::default().with_dims(4, 2).hyperparameters_for(3);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let _net = RelaxationNet::new(3, &hp, vb).unwrap();

        let data = varmap.data().lock().unwrap();
        let mut names: Vec<_> = data.keys().cloned().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "conv1.bias",
                "conv1.weight",
                "conv2.bias",
                "conv2.weight",
                "embedding"
            ]
        );
    }

    #[test]
    fn test_rejects_empty_graph() {
        let hp = RunConfig::default().hyperparameters_for(0);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(RelaxationNet::new(0, &hp, vb).is_err());
    }
}
