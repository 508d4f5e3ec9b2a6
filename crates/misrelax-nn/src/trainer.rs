//! Training loop.
//!
//! Each epoch:
//!
//! 1. forward pass → probabilities `p`
//! 2. `loss = pᵀ Q p`
//! 3. backward pass and optimizer step
//! 4. threshold `p` into a bitstring `b` and evaluate its discrete cost
//! 5. keep `b` if its cost beats the best seen so far
//! 6. early stopping: a loss change below `tolerance` uses up one unit of
//!    patience, any larger change restores it; out of patience stops the run
//!
//! Two bitstrings come out: the final epoch's decode and the lowest-cost
//! decode over the whole trajectory. The continuous loss can keep improving
//! while individual decodes jitter, so the best one is the reported answer.
//! Best-cost tracking and early stopping are independent: the best bitstring
//! can still improve while patience is running down.

use crate::config::Hyperparameters;
use crate::factory::Model;
use crate::loss::{bitstring_cost, qubo_loss};
use crate::{Error, Result};
use candle_core::{DType, Tensor};
use candle_nn::Optimizer;
use misrelax_core::decode::threshold;
use serde::{Deserialize, Serialize};

/// Where the training loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    /// Still iterating.
    Running,
    /// Patience ran out.
    StoppedEarly,
    /// Epoch budget used up without early stopping.
    Exhausted,
}

/// Mutable loop state, advanced once per epoch by [`TrainingState::observe`].
#[derive(Debug, Clone)]
pub struct TrainingState {
    /// Epochs completed.
    pub epoch: usize,
    /// Loss of the previous epoch (`+inf` before the first).
    pub prev_loss: f32,
    /// Remaining stalled epochs before stopping.
    pub patience_counter: usize,
    /// Lowest discrete cost seen.
    pub best_cost: f32,
    /// Bitstring achieving `best_cost`.
    pub best_bitstring: Option<Vec<u8>>,
    /// Current status.
    pub status: TrainStatus,
    patience: usize,
    tolerance: f32,
}

impl TrainingState {
    /// Initial state for a run.
    pub fn new(patience: usize, tolerance: f32) -> Self {
        Self {
            epoch: 0,
            prev_loss: f32::INFINITY,
            patience_counter: patience,
            best_cost: f32::INFINITY,
            best_bitstring: None,
            status: TrainStatus::Running,
            patience,
            tolerance,
        }
    }

    /// Record one finished epoch and return the resulting status.
    ///
    /// `bits` is moved into the best slot only when `cost` improves on it.
    pub fn observe(&mut self, loss: f32, bits: &[u8], cost: f32) -> TrainStatus {
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_bitstring = Some(bits.to_vec());
        }

        if (loss - self.prev_loss).abs() < self.tolerance {
            self.patience_counter = self.patience_counter.saturating_sub(1);
        } else {
            self.patience_counter = self.patience;
        }
        if self.patience_counter == 0 {
            self.status = TrainStatus::StoppedEarly;
        }

        self.prev_loss = loss;
        self.epoch += 1;
        self.status
    }
}

/// Per-epoch trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Continuous loss `pᵀ Q p`.
    pub loss: f32,
    /// Discrete cost of this epoch's bitstring.
    pub cost: f32,
    /// Best discrete cost up to and including this epoch.
    pub best_cost: f32,
}

/// Result of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Terminal status: `StoppedEarly` or `Exhausted`.
    pub status: TrainStatus,
    /// Epochs completed.
    pub epochs_run: usize,
    /// Last epoch's thresholded probabilities (may violate constraints).
    pub final_bitstring: Vec<u8>,
    /// Lowest-cost bitstring over all epochs.
    pub best_bitstring: Vec<u8>,
    /// Discrete cost of `best_bitstring`.
    pub best_cost: f32,
    /// Last continuous loss, if any epoch ran.
    pub final_loss: Option<f32>,
    /// Per-epoch trace.
    pub history: Vec<EpochRecord>,
}

/// Train `model` against the dense QUBO `q` over adjacency `adj`.
///
/// Non-finite loss aborts with [`Error::Diverged`]. Reaching the epoch
/// budget is not an error; it shows up as [`TrainStatus::Exhausted`].
pub fn train(
    model: &mut Model,
    adj: &Tensor,
    q: &Tensor,
    hp: &Hyperparameters,
) -> Result<TrainingOutcome> {
    if hp.patience == 0 {
        return Err(Error::InvalidConfig("patience must be at least 1".into()));
    }

    let mut state = TrainingState::new(hp.patience, hp.tolerance);
    let mut history = Vec::new();
    let mut final_bitstring = None;
    let log_every = hp.log_every.max(1);

    while state.epoch < hp.number_epochs {
        let epoch = state.epoch;

        let probs = model.net.forward(adj, true)?;
        let loss = qubo_loss(&probs, q)?;
        let loss_value = loss.to_dtype(DType::F32)?.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(Error::Diverged {
                epoch,
                last_finite_loss: state.prev_loss.is_finite().then_some(state.prev_loss),
            });
        }

        model.optimizer.backward_step(&loss)?;

        let p: Vec<f32> = probs.to_dtype(DType::F32)?.to_vec1()?;
        let bits = threshold(&p, hp.prob_threshold);
        let cost = bitstring_cost(&bits, q)?;

        let status = state.observe(loss_value, &bits, cost);
        history.push(EpochRecord {
            loss: loss_value,
            cost,
            best_cost: state.best_cost,
        });

        if epoch % log_every == 0 {
            tracing::debug!(epoch, loss = loss_value, best_cost = state.best_cost, "training");
        }

        final_bitstring = Some(bits);
        if status == TrainStatus::StoppedEarly {
            tracing::info!(epoch, loss = loss_value, "early stopping");
            break;
        }
    }

    if state.status == TrainStatus::Running {
        state.status = TrainStatus::Exhausted;
        if hp.number_epochs > 0 {
            tracing::warn!(
                epochs = hp.number_epochs,
                "epoch budget exhausted without early stopping"
            );
        }
    }

    // Zero-epoch budget: decode the untrained network once.
    let final_bitstring = match final_bitstring {
        Some(bits) => bits,
        None => {
            let p: Vec<f32> = model.net.forward(adj, false)?.to_dtype(DType::F32)?.to_vec1()?;
            let bits = threshold(&p, hp.prob_threshold);
            let cost = bitstring_cost(&bits, q)?;
            state.best_cost = cost;
            state.best_bitstring = Some(bits.clone());
            bits
        }
    };

    let best_bitstring = state
        .best_bitstring
        .unwrap_or_else(|| final_bitstring.clone());

    Ok(TrainingOutcome {
        status: state.status,
        epochs_run: state.epoch,
        final_bitstring,
        best_bitstring,
        best_cost: state.best_cost,
        final_loss: history.last().map(|r| r.loss),
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::conv::normalized_adjacency;
    use crate::factory::build_model;
    use crate::loss::qubo_tensor;
    use candle_core::Device;
    use misrelax_core::{Graph, QuboMatrix};

    #[test]
    fn test_state_initial() {
        let s = TrainingState::new(5, 1e-3);
        assert_eq!(s.epoch, 0);
        assert_eq!(s.patience_counter, 5);
        assert!(s.prev_loss.is_infinite());
        assert!(s.best_cost.is_infinite());
        assert!(s.best_bitstring.is_none());
        assert_eq!(s.status, TrainStatus::Running);
    }

    #[test]
    fn test_state_stops_after_patience_stalls() {
        let mut s = TrainingState::new(3, 1e-3);
        // First epoch always counts as a change from +inf.
        assert_eq!(s.observe(1.0, &[0], 0.0), TrainStatus::Running);
        assert_eq!(s.observe(1.0, &[0], 0.0), TrainStatus::Running);
        assert_eq!(s.observe(1.0, &[0], 0.0), TrainStatus::Running);
        assert_eq!(s.observe(1.0, &[0], 0.0), TrainStatus::StoppedEarly);
        assert_eq!(s.epoch, 4);
    }

    #[test]
    fn test_state_resets_patience_on_change() {
        let mut s = TrainingState::new(2, 1e-3);
        s.observe(1.0, &[0], 0.0);
        s.observe(1.0, &[0], 0.0);
        assert_eq!(s.patience_counter, 1);
        s.observe(0.5, &[0], 0.0);
        assert_eq!(s.patience_counter, 2);
        assert_eq!(s.status, TrainStatus::Running);
    }

    #[test]
    fn test_state_best_tracking_independent_of_patience() {
        let mut s = TrainingState::new(10, 1.0);
        s.observe(0.0, &[1, 0], -1.0);
        s.observe(0.0, &[1, 1], 3.0);
        assert_eq!(s.best_bitstring.as_deref(), Some(&[1u8, 0][..]));
        // loss stalled, but a better decode still replaces the best
        s.observe(0.0, &[0, 1], -2.0);
        assert_eq!(s.best_cost, -2.0);
        assert_eq!(s.best_bitstring.as_deref(), Some(&[0u8, 1][..]));
        assert!(s.patience_counter < 10);
    }

    #[test]
    fn test_state_equal_cost_keeps_first() {
        let mut s = TrainingState::new(10, 0.0);
        s.observe(0.0, &[1, 0], -1.0);
        s.observe(1.0, &[0, 1], -1.0);
        assert_eq!(s.best_bitstring.as_deref(), Some(&[1u8, 0][..]));
    }

    fn setup(g: &Graph, cfg: &RunConfig) -> (Model, Tensor, Tensor) {
        let device = Device::Cpu;
        let hp = cfg.hyperparameters_for(g.node_count());
        let model = build_model(
            g.node_count(),
            &hp,
            &cfg.optimizer_params(),
            cfg.random_seed,
            &device,
        )
        .unwrap();
        let adj = normalized_adjacency(g, DType::F32, &device).unwrap();
        let q = qubo_tensor(&QuboMatrix::for_mis(g, cfg.penalty).unwrap(), DType::F32, &device)
            .unwrap();
        (model, adj, q)
    }

    #[test]
    fn test_train_exhausts_small_budget() {
        let g = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3)]).unwrap();
        let cfg = RunConfig::default()
            .with_dims(4, 2)
            .with_epochs(5)
            .with_early_stopping(0.0, 100);
        let (mut model, adj, q) = setup(&g, &cfg);

        let out = train(&mut model, &adj, &q, &cfg.hyperparameters_for(4)).unwrap();
        assert_eq!(out.status, TrainStatus::Exhausted);
        assert_eq!(out.epochs_run, 5);
        assert_eq!(out.history.len(), 5);
        assert_eq!(out.final_bitstring.len(), 4);
        assert_eq!(out.best_bitstring.len(), 4);
        assert!(out.final_loss.is_some());
    }

    #[test]
    fn test_train_stops_early_with_huge_tolerance() {
        let g = Graph::from_edges(3, [(0, 1)]).unwrap();
        let cfg = RunConfig::default()
            .with_dims(2, 1)
            .with_epochs(1000)
            .with_early_stopping(1e6, 3);
        let (mut model, adj, q) = setup(&g, &cfg);

        let out = train(&mut model, &adj, &q, &cfg.hyperparameters_for(3)).unwrap();
        assert_eq!(out.status, TrainStatus::StoppedEarly);
        // first epoch compares against +inf, then 3 stalled epochs
        assert_eq!(out.epochs_run, 4);
    }

    #[test]
    fn test_train_zero_epochs() {
        let g = Graph::from_edges(3, [(0, 1)]).unwrap();
        let cfg = RunConfig::default().with_dims(2, 1).with_epochs(0);
        let (mut model, adj, q) = setup(&g, &cfg);

        let out = train(&mut model, &adj, &q, &cfg.hyperparameters_for(3)).unwrap();
        assert_eq!(out.status, TrainStatus::Exhausted);
        assert_eq!(out.epochs_run, 0);
        assert!(out.history.is_empty());
        assert_eq!(out.final_bitstring, out.best_bitstring);
        assert!(out.best_cost.is_finite());
        assert!(out.final_loss.is_none());
    }

    #[test]
    fn test_train_detects_divergence() {
        let g = Graph::from_edges(3, [(0, 1)]).unwrap();
        let cfg = RunConfig::default().with_dims(2, 1).with_epochs(10);
        let (mut model, adj, _) = setup(&g, &cfg);
        let q = Tensor::full(f32::NAN, (3, 3), &Device::Cpu).unwrap();

        let err = train(&mut model, &adj, &q, &cfg.hyperparameters_for(3)).unwrap_err();
        assert!(matches!(
            err,
            Error::Diverged {
                epoch: 0,
                last_finite_loss: None
            }
        ));
    }
}
