//! End-to-end solve: graph in, decoded independent sets out.

use crate::config::RunConfig;
use crate::conv::normalized_adjacency;
use crate::factory::{build_model, MODEL_DTYPE};
use crate::loss::qubo_tensor;
use crate::trainer::{train, TrainStatus, TrainingOutcome};
use crate::Result;
use candle_core::Device;
use misrelax_core::decode::{decode, Decoded};
use misrelax_core::{Graph, QuboMatrix};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Report of one solver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisRun {
    /// Nodes in the input graph.
    pub num_nodes: usize,
    /// Edges in the input graph.
    pub num_edges: usize,
    /// How training ended.
    pub status: TrainStatus,
    /// Epochs completed.
    pub epochs_run: usize,
    /// Decode of the lowest-cost bitstring (the answer).
    pub best: Decoded,
    /// Decode of the last epoch's bitstring.
    pub final_solution: Decoded,
    /// Discrete QUBO cost of `best`.
    pub best_cost: f32,
    /// Last continuous loss.
    pub final_loss: Option<f32>,
    /// Wall-clock time for QUBO construction, training and decoding.
    pub elapsed: Duration,
}

/// Generate the configured random graph and solve it.
pub fn generate_and_solve(config: &RunConfig) -> Result<(Graph, MisRun)> {
    config.validate()?;
    let graph = misrelax_core::generate(&config.generator_config())?;
    let run = solve(&graph, config)?;
    Ok((graph, run))
}

/// Solve MIS on `graph` on the CPU.
pub fn solve(graph: &Graph, config: &RunConfig) -> Result<MisRun> {
    solve_on(graph, config, &Device::Cpu)
}

/// Solve MIS on `graph` with tensors on `device`.
///
/// The configuration's graph-generation fields are ignored; network widths
/// default from `graph.node_count()`.
pub fn solve_on(graph: &Graph, config: &RunConfig, device: &Device) -> Result<MisRun> {
    config.validate_training()?;
    let start = Instant::now();
    let n = graph.node_count();

    let qubo = QuboMatrix::for_mis(graph, config.penalty)?;

    if n == 0 {
        let empty = decode(&[], graph)?;
        return Ok(MisRun {
            num_nodes: 0,
            num_edges: 0,
            status: TrainStatus::Exhausted,
            epochs_run: 0,
            best: empty.clone(),
            final_solution: empty,
            best_cost: 0.0,
            final_loss: None,
            elapsed: start.elapsed(),
        });
    }

    let hp = config.hyperparameters_for(n);
    let q = qubo_tensor(&qubo, MODEL_DTYPE, device)?;
    let adj = normalized_adjacency(graph, MODEL_DTYPE, device)?;
    let mut model = build_model(
        n,
        &hp,
        &config.optimizer_params(),
        config.random_seed,
        device,
    )?;

    tracing::info!(
        n,
        edges = graph.edge_count(),
        dim_embedding = hp.dim_embedding,
        hidden_dim = hp.hidden_dim,
        epochs = hp.number_epochs,
        "training relaxation network"
    );

    let outcome = train(&mut model, &adj, &q, &hp)?;
    let run = report(graph, outcome, start.elapsed())?;

    tracing::info!(
        status = ?run.status,
        epochs = run.epochs_run,
        size = run.best.solution_size,
        violations = run.best.violations,
        "run finished"
    );
    if run.final_solution.violations > 0 {
        tracing::warn!(
            violations = run.final_solution.violations,
            "final-epoch decode is not independent"
        );
    }
    Ok(run)
}

fn report(graph: &Graph, outcome: TrainingOutcome, elapsed: Duration) -> Result<MisRun> {
    let best = decode(&outcome.best_bitstring, graph)?;
    let final_solution = decode(&outcome.final_bitstring, graph)?;
    Ok(MisRun {
        num_nodes: graph.node_count(),
        num_edges: graph.edge_count(),
        status: outcome.status,
        epochs_run: outcome.epochs_run,
        best,
        final_solution,
        best_cost: outcome.best_cost,
        final_loss: outcome.final_loss,
        elapsed,
    })
}
