//! gridroute - cheapest landmark route across a cost grid

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use gridroute_cli::loader::check_endpoints;
use gridroute_cli::{load_input, Config, LoadError, LogFormat, Manifest, ScratchTrace};
use gridroute_core::{all_simple_paths, format_json, format_text, SearchError, SearchOrchestrator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the cheapest landmark route across a cost grid")]
struct Args {
    /// Cost grid file
    grid: PathBuf,

    /// Landmark nodes file
    nodes: PathBuf,

    /// Start node index
    start: usize,

    /// Destination node index
    dest: usize,

    /// Report file (stdout when omitted)
    output: Option<PathBuf>,

    /// Directory for intermediate trace files
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Empty the scratch directory once the report is written
    #[arg(long, requires = "scratch_dir")]
    clean_scratch: bool,

    /// Nearest neighbors per node
    #[arg(long)]
    neighbors: Option<usize>,

    /// Minimum nodes in a candidate path
    #[arg(long)]
    min_nodes: Option<usize>,

    /// Maximum nodes in a candidate path
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Runtime worker threads
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = resolve_config(&args);

    if let Err(err) = init_tracing(config.log_format) {
        eprintln!("failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "gridroute failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Environment first, then command-line overrides.
fn resolve_config(args: &Args) -> Config {
    let mut config = Config::from_env();
    if let Some(k) = args.neighbors {
        config.search.k_neighbors = k;
    }
    if let Some(min) = args.min_nodes {
        config.search.min_nodes = min;
    }
    if let Some(max) = args.max_nodes {
        config.search.max_nodes = max;
    }
    if let Some(workers) = args.workers.filter(|&w| w > 0) {
        config.workers = workers;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }
    config
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("gridroute=info".parse()?)
        .add_directive("gridroute_cli=info".parse()?)
        .add_directive("gridroute_core=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let input = load_input(&args.grid, &args.nodes, config.search.k_neighbors)?;
    check_endpoints(&input.graph, args.start, args.dest)?;

    let trace = match &args.scratch_dir {
        Some(dir) => {
            let trace = ScratchTrace::create(dir)
                .with_context(|| format!("failed to create scratch directory {}", dir.display()))?;
            trace
                .write_manifest(&Manifest {
                    grid: args.grid.clone(),
                    nodes: args.nodes.clone(),
                    start: args.start,
                    dest: args.dest,
                    config: config.search.clone(),
                    workers: config.workers,
                    created_at: Utc::now(),
                })
                .context("failed to write manifest")?;
            trace.write_graph(&input.graph).context("failed to write graph dump")?;
            let tree = all_simple_paths(&input.graph, args.start, args.dest)?;
            trace.write_paths("tree.txt", &tree).context("failed to write path tree")?;
            Some(Arc::new(trace))
        }
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .max_blocking_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let mut orchestrator = SearchOrchestrator::new(input.graph, input.grid, config.search.clone());
    if let Some(trace) = &trace {
        orchestrator = orchestrator.with_observer(trace.clone());
    }

    let candidates = orchestrator.candidates(args.start, args.dest)?;
    if let Some(trace) = &trace {
        trace
            .write_paths("tree_valid.txt", &candidates)
            .context("failed to write candidate paths")?;
    }
    tracing::info!(
        start = args.start,
        dest = args.dest,
        candidates = candidates.len(),
        workers = config.workers,
        "evaluating candidate routes"
    );

    let result = runtime.block_on(orchestrator.find_best_route(candidates, args.start))?;

    let report = match args.format {
        OutputFormat::Text => format_text(&result.outcome),
        OutputFormat::Json => format_json(&result.outcome).context("failed to encode report")? + "\n",
    };
    match &args.output {
        Some(path) => fs::write(path, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => print!("{report}"),
    }

    if let Some(trace) = &trace {
        if args.clean_scratch {
            trace.clear().context("failed to clean scratch directory")?;
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<LoadError>() {
        return err.exit_code();
    }
    match err.downcast_ref::<SearchError>() {
        Some(
            SearchError::Worker { .. }
            | SearchError::Solve { .. }
            | SearchError::SlotPoisoned
            | SearchError::Cancelled,
        ) => 80,
        Some(_) => 2,
        None if err.downcast_ref::<gridroute_core::GraphError>().is_some() => 2,
        None => 1,
    }
}
