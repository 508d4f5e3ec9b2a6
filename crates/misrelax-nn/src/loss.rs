//! QUBO loss.
//!
//! The only training signal is the quadratic form of the relaxed
//! assignment:
//!
//! ```text
//! L(p) = pᵀ Q p
//! ```
//!
//! There are no labels. Lower is better: node `u` contributes `-p_u²`, each
//! edge `P · p_u · p_v`. On a 0/1 vector `p_u² = p_u`, so the same function
//! is the discrete cost of a decoded bitstring.

use crate::{Error, Result};
use candle_core::{DType, Device, Tensor};
use misrelax_core::QuboMatrix;

/// Dense `[n, n]` tensor for a QUBO matrix.
pub fn qubo_tensor(qubo: &QuboMatrix, dtype: DType, device: &Device) -> Result<Tensor> {
    let n = qubo.dim();
    Ok(Tensor::from_vec(qubo.to_dense(), (n, n), device)?.to_dtype(dtype)?)
}

/// Scalar `pᵀ Q p` for a probability vector of length `n`.
///
/// Differentiable with respect to whatever produced `probs`.
pub fn qubo_loss(probs: &Tensor, q: &Tensor) -> Result<Tensor> {
    let n = q.dim(0)?;
    if q.dim(1)? != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: q.dim(1)?,
        });
    }
    if probs.rank() != 1 || probs.dim(0)? != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: probs.elem_count(),
        });
    }

    let p = probs.unsqueeze(1)?;
    Ok(q.matmul(&p)?.mul(&p)?.sum_all()?)
}

/// Discrete QUBO cost of a bitstring, through the same quadratic form.
pub fn bitstring_cost(bits: &[u8], q: &Tensor) -> Result<f32> {
    let x: Vec<f32> = bits.iter().map(|&b| f32::from(b)).collect();
    let x = Tensor::from_vec(x, bits.len(), q.device())?.to_dtype(q.dtype())?;
    Ok(qubo_loss(&x, q)?.to_dtype(DType::F32)?.to_scalar::<f32>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Var;
    use misrelax_core::Graph;

    fn cycle_q() -> Tensor {
        let g = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let q = QuboMatrix::for_mis(&g, 2.0).unwrap();
        qubo_tensor(&q, DType::F32, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_loss_matches_hand_computation() {
        let q = cycle_q();
        let p = Tensor::new(&[0.5f32, 0.5, 0.5, 0.5], &Device::Cpu).unwrap();
        // -4 * 0.25 + 4 edges * 2 * 0.25
        let loss = qubo_loss(&p, &q).unwrap().to_scalar::<f32>().unwrap();
        assert!((loss - 1.0).abs() < 1e-6);

        let p = Tensor::new(&[0.9f32, 0.1, 0.9, 0.1], &Device::Cpu).unwrap();
        // -(0.81 + 0.01 + 0.81 + 0.01) + 4 edges * 2 * 0.09
        let loss = qubo_loss(&p, &q).unwrap().to_scalar::<f32>().unwrap();
        assert!((loss - (-1.64 + 0.72)).abs() < 1e-5);
    }

    #[test]
    fn test_bitstring_cost() {
        let q = cycle_q();
        assert!((bitstring_cost(&[1, 0, 1, 0], &q).unwrap() + 2.0).abs() < 1e-6);
        assert!((bitstring_cost(&[1, 1, 1, 1], &q).unwrap() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_loss_gradient() {
        // dL/dp = 2 Q p for symmetric Q
        let q = cycle_q();
        let p = Var::new(&[0.5f32, 0.5, 0.5, 0.5], &Device::Cpu).unwrap();
        let loss = qubo_loss(p.as_tensor(), &q).unwrap();
        let grads = loss.backward().unwrap();
        let g: Vec<f32> = grads.get(&p).unwrap().to_vec1().unwrap();
        // row of Q: -1 on diagonal, 1 on each of two neighbors -> Qp = 0.5
        for v in g {
            assert!((v - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let q = cycle_q();
        let p = Tensor::new(&[0.5f32, 0.5], &Device::Cpu).unwrap();
        assert!(matches!(
            qubo_loss(&p, &q),
            Err(Error::DimensionMismatch { expected: 4, got: 2 })
        ));
    }
}
