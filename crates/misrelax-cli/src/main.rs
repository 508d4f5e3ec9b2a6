//! misrelax CLI - Maximum Independent Set by GNN relaxation.
//!
//! # Usage
//!
//! ```bash
//! # Write a random 3-regular graph on 100 nodes
//! misrelax generate --n 100 --degree 3 --seed 1 -o graph.txt
//!
//! # Classical answers for comparison
//! misrelax reference graph.txt
//! misrelax reference graph.txt --exact
//!
//! # Train on a file, or on a freshly generated graph
//! misrelax solve graph.txt --lr 0.01 --compare
//! misrelax solve --n 50 --degree 3 --epochs 5000 --json
//!
//! # Hyperparameters from a JSON file, overridden on the command line
//! misrelax solve --config run.json --seed 7
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use misrelax_core::algo::reference::EXACT_MAX_NODES;
use misrelax_core::{generate, GeneratorConfig, Graph, ReferenceSolution, ReferenceSolver};
use misrelax_nn::{MisRun, RunConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "misrelax")]
#[command(about = "Maximum Independent Set via QUBO relaxation and a GCN", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random graph and write it as an edge list
    Generate {
        /// Number of nodes
        #[arg(long, default_value = "100")]
        n: usize,

        /// Node degree (regular graph)
        #[arg(short, long, default_value = "3", conflicts_with = "probability")]
        degree: usize,

        /// Edge probability (Erdős–Rényi graph)
        #[arg(short, long)]
        probability: Option<f64>,

        /// Random seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Solve MIS with a classical algorithm
    Reference {
        /// Input edge list
        input: PathBuf,

        /// Exact branch-and-bound instead of greedy
        #[arg(long)]
        exact: bool,
    },

    /// Train the relaxation network and decode an independent set
    Solve {
        /// Input edge list (omit to generate from the configuration)
        input: Option<PathBuf>,

        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        /// Also run the classical solvers
        #[arg(long)]
        compare: bool,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Command-line settings applied on top of the configuration file.
#[derive(clap::Args)]
struct Overrides {
    /// Number of nodes (generated graphs)
    #[arg(long)]
    n: Option<usize>,

    /// Node degree (generated regular graphs)
    #[arg(short, long, conflicts_with = "probability")]
    degree: Option<usize>,

    /// Edge probability (generated Erdős–Rényi graphs)
    #[arg(short, long)]
    probability: Option<f64>,

    /// Maximum training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Early-stopping loss tolerance
    #[arg(long)]
    tolerance: Option<f32>,

    /// Early-stopping patience
    #[arg(long)]
    patience: Option<usize>,

    /// Edge penalty in the QUBO matrix
    #[arg(long)]
    penalty: Option<f64>,

    /// Node embedding width
    #[arg(long)]
    dim_embedding: Option<usize>,

    /// Hidden layer width
    #[arg(long)]
    hidden_dim: Option<usize>,

    /// Decision threshold on node probabilities
    #[arg(long)]
    threshold: Option<f32>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Overrides {
    fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(n) = self.n {
            config = config.with_n(n);
        }
        if let Some(d) = self.degree {
            config = config.with_degree(d);
        }
        if let Some(p) = self.probability {
            config = config.with_probability(p);
        }
        if let Some(epochs) = self.epochs {
            config = config.with_epochs(epochs);
        }
        if let Some(lr) = self.lr {
            config = config.with_learning_rate(lr);
        }
        if let Some(tol) = self.tolerance {
            config.tolerance = tol;
        }
        if let Some(patience) = self.patience {
            config.patience = patience;
        }
        if let Some(penalty) = self.penalty {
            config = config.with_penalty(penalty);
        }
        if self.dim_embedding.is_some() {
            config.dim_embedding = self.dim_embedding;
        }
        if self.hidden_dim.is_some() {
            config.hidden_dim = self.hidden_dim;
        }
        if let Some(t) = self.threshold {
            config.prob_threshold = t;
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            n,
            degree,
            probability,
            seed,
            output,
        } => cmd_generate(n, degree, probability, seed, &output),
        Commands::Reference { input, exact } => cmd_reference(&input, exact),
        Commands::Solve {
            input,
            config,
            overrides,
            compare,
            json,
        } => cmd_solve(input.as_deref(), config.as_deref(), overrides, compare, json),
    }
}

fn load_graph(path: &Path) -> Result<Graph> {
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", path.display()));

    let graph = Graph::from_edge_list_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));
    Ok(graph)
}

fn cmd_generate(
    n: usize,
    degree: usize,
    probability: Option<f64>,
    seed: u64,
    output: &Path,
) -> Result<()> {
    let config = match probability {
        Some(p) => GeneratorConfig::probabilistic(n, p, seed),
        None => GeneratorConfig::regular(n, degree, seed),
    };
    let graph = generate(&config).context("Failed to generate graph")?;

    graph
        .to_edge_list_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} nodes, {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

fn cmd_reference(input: &Path, exact: bool) -> Result<()> {
    let graph = load_graph(input)?;
    let solver = if exact {
        ReferenceSolver::Exact
    } else {
        ReferenceSolver::Greedy
    };
    let solution = solver
        .solve(&graph)
        .with_context(|| format!("{:?} solver failed", solver))?;

    println!("Reference Solution ({:?})", solver);
    println!("==========================");
    println!("Nodes:          {}", graph.node_count());
    println!("Edges:          {}", graph.edge_count());
    print_reference(&solution);
    Ok(())
}

fn cmd_solve(
    input: Option<&Path>,
    config_path: Option<&Path>,
    overrides: Overrides,
    compare: bool,
    json: bool,
) -> Result<()> {
    let base = match config_path {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => RunConfig::default(),
    };
    let config = overrides.apply(base);

    let graph = match input {
        Some(path) => load_graph(path)?,
        None => {
            config.validate().context("Invalid configuration")?;
            generate(&config.generator_config()).context("Failed to generate graph")?
        }
    };

    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!(
        "Training on {} nodes, {} edges...",
        graph.node_count(),
        graph.edge_count()
    ));
    let run = misrelax_nn::solve(&graph, &config);
    pb.finish_and_clear();
    let run = run.context("Training failed")?;

    let reference = if compare {
        Some(reference_solutions(&graph)?)
    } else {
        None
    };

    if json {
        let report = serde_json::json!({
            "config": config,
            "run": run,
            "greedy": reference.as_ref().map(|(greedy, _)| greedy),
            "exact": reference.as_ref().and_then(|(_, exact)| exact.as_ref()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_run(&run);
    if let Some((greedy, exact)) = reference {
        println!();
        println!("Greedy:");
        print_reference(&greedy);
        if let Some(exact) = exact {
            println!();
            println!("Exact:");
            print_reference(&exact);
            if exact.size > 0 && run.best.violations == 0 {
                println!(
                    "Approx. ratio:  {:.3}",
                    run.best.solution_size as f64 / exact.size as f64
                );
            }
        }
    }
    Ok(())
}

fn reference_solutions(graph: &Graph) -> Result<(ReferenceSolution, Option<ReferenceSolution>)> {
    let greedy = ReferenceSolver::Greedy.solve(graph)?;
    let exact = if graph.node_count() <= EXACT_MAX_NODES {
        Some(ReferenceSolver::Exact.solve(graph)?)
    } else {
        tracing::info!(
            n = graph.node_count(),
            max = EXACT_MAX_NODES,
            "graph too large for the exact solver"
        );
        None
    };
    Ok((greedy, exact))
}

fn print_run(run: &MisRun) {
    println!("MIS Relaxation Run");
    println!("==========================");
    println!("Nodes:          {}", run.num_nodes);
    println!("Edges:          {}", run.num_edges);
    println!("Status:         {:?}", run.status);
    println!("Epochs:         {}", run.epochs_run);
    if let Some(loss) = run.final_loss {
        println!("Final loss:     {:.4}", loss);
    }
    println!("Best cost:      {:.1}", run.best_cost);
    println!("Set size:       {}", run.best.solution_size);
    println!("Violations:     {}", run.best.violations);
    println!(
        "Final epoch:    {} nodes, {} violations",
        run.final_solution.solution_size, run.final_solution.violations
    );
    println!("Time:           {:.2?}", run.elapsed);
}

fn print_reference(solution: &ReferenceSolution) {
    println!("Set size:       {}", solution.size);
    println!("Violations:     {}", solution.violations);
    println!("Time:           {:.2?}", solution.elapsed);
}
