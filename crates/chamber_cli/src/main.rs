//! CHAMBER CLI
//!
//! Runs a pipeline script: compiles it into a stage graph, starts the
//! workers and, in prompt mode, takes operator commands from stdin.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod prompt;

use chamber_command::CommandRegistry;
use chamber_plan::{parse_script, Statement};
use chamber_runtime::{BuildError, Graph, GraphBuilder, RunConfig, RunController, RunOutcome, StageFailure};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "chamber")]
#[command(version, about = "CHAMBER - multi-threaded pipeline script runner", long_about = None)]
struct Cli {
    /// Script file; read from stdin when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Default worker threads for multi-threaded stages
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Reordering window per stage [default: threads * 100]
    #[arg(short = 'u', long = "unsrt-limit", value_name = "N")]
    unsrt_limit: Option<usize>,

    /// Take operator commands from stdin while running
    #[arg(short, long)]
    prompt: bool,

    /// Log stage lifecycle at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Build the graph and print a summary without running it
    #[arg(long)]
    check: bool,

    /// With --check, print the parsed statements as JSON
    #[arg(long, requires = "check")]
    json: bool,
}

impl Cli {
    fn config(&self) -> RunConfig {
        let config = RunConfig::default().with_threads(self.threads);
        match self.unsrt_limit {
            Some(limit) => config.with_unsorted_limit(limit),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.prompt && cli.file.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the following arguments are required in prompt mode: FILE",
            )
            .exit();
    }
    let config = cli.config();
    if let Err(err) = config.validate() {
        Cli::command().error(ErrorKind::ValueValidation, err).exit();
    }

    let source = load_source(cli.file.as_deref())?;
    let registry = CommandRegistry::with_builtins();
    let (statements, graph) = match compile(&registry, config, &source) {
        Ok(compiled) => compiled,
        Err(err) => {
            report_build_error(&err);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.check {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&statements)?);
        } else {
            print_summary(&graph);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let handle = RunController::new(graph).start()?;
    let switch = handle.kill_switch();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("Killing processes...");
        switch.kill();
        // A second interrupt gives up on a clean shutdown
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let interactive = cli.prompt;
    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        if interactive {
            prompt::run(&handle)?;
        }
        Ok(handle.wait())
    })
    .await
    .wrap_err("run supervisor panicked")??;

    match report.outcome {
        RunOutcome::Failed(failure) => {
            report_stage_failure(&failure);
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::Completed | RunOutcome::Killed => Ok(ExitCode::SUCCESS),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).wrap_err_with(|| format!("cannot read script {}", path.display()))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .wrap_err("cannot read script from stdin")?;
            Ok(source)
        }
    }
}

fn compile(
    registry: &CommandRegistry,
    config: RunConfig,
    source: &str,
) -> Result<(Vec<Statement>, Graph), BuildError> {
    let statements = parse_script(source)?;
    let graph = GraphBuilder::from_statements(registry, config, &statements)?;
    Ok((statements, graph))
}

fn print_summary(graph: &Graph) {
    for stage in graph.stages() {
        println!(
            "{:>4}  {:<12} in={} out={} workers={}",
            stage.line(),
            stage.command(),
            stage.inputs(),
            stage.outputs().len(),
            stage.workers()
        );
    }
    println!("{} stages, {} workers", graph.len(), graph.worker_count());
}

fn report_build_error(err: &BuildError) {
    eprintln!("{}", err);
    if let Some(trace) = err.trace() {
        eprintln!("{}", trace);
    }
}

fn report_stage_failure(failure: &StageFailure) {
    eprintln!("At line {}:", failure.line);
    eprintln!("{}", failure.message);
    if let Some(trace) = &failure.trace {
        eprintln!("{}", trace);
    }
}
