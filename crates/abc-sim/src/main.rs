use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use abc_smc::{resume, run, RunSummary, SmcConfig, StageSnapshot};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use models::DemoModel;

mod models;

#[derive(Parser, Debug)]
#[command(name = "abc-sim", about = "SMC-ABC sampler CLI")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a built-in model against synthetic observations.
    Run(RunArgs),
    /// Continue a run from a stage snapshot.
    Resume(ResumeArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// YAML configuration describing the sampler run.
    #[arg(long)]
    config: PathBuf,
    /// Demonstration model to fit.
    #[arg(long, value_enum)]
    model: DemoModel,
    /// Output directory for run artefacts; overrides `output.run_directory`.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Number of synthetic observations.
    #[arg(long, default_value_t = 100)]
    observed: usize,
    /// Parameter value used to generate the observations.
    #[arg(long)]
    true_value: Option<f64>,
}

#[derive(ClapArgs, Debug)]
struct ResumeArgs {
    /// Snapshot written by a previous run.
    #[arg(long)]
    checkpoint: PathBuf,
    /// Demonstration model the snapshot was produced with.
    #[arg(long, value_enum)]
    model: DemoModel,
    /// Number of observations per simulation; must match the original run.
    #[arg(long, default_value_t = 100)]
    observed: usize,
}

#[derive(Debug, Serialize)]
struct CliSummary<'a> {
    model: &'static str,
    stages: usize,
    epsilons: &'a [f64],
    posterior_means: &'a IndexMap<String, f64>,
    acceptance_rate: f64,
    trace_hash: &'a str,
    run_directory: Option<&'a Path>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    match cli.command {
        Command::Run(args) => run_model(args),
        Command::Resume(args) => resume_model(args),
    }
}

fn run_model(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config, args.out.as_deref())?;
    let true_value = args
        .true_value
        .unwrap_or_else(|| args.model.default_true_value());
    let observed = args
        .model
        .observe(true_value, args.observed, config.master_seed())?;
    let prior = args.model.prior()?;
    let simulator = args.model.simulator(args.observed);
    info!(
        "fitting {} to {} observations generated at {}",
        args.model.label(),
        args.observed,
        true_value
    );

    let summary = run(&config, &prior, &simulator, &observed)?;
    report(args.model, &summary, config.output.run_directory.as_deref())
}

fn resume_model(args: ResumeArgs) -> Result<(), Box<dyn Error>> {
    let snapshot = StageSnapshot::load(&args.checkpoint)?;
    let run_directory = snapshot.config.output.run_directory.clone();
    let prior = args.model.prior()?;
    let simulator = args.model.simulator(args.observed);
    info!(
        "resuming {} from {}",
        args.model.label(),
        args.checkpoint.display()
    );
    let summary = resume(&args.checkpoint, &prior, &simulator)?;
    report(args.model, &summary, run_directory.as_deref())
}

fn load_config(path: &Path, out_dir: Option<&Path>) -> Result<SmcConfig, Box<dyn Error>> {
    let mut config = SmcConfig::from_yaml_file(path)?;
    if let Some(out_dir) = out_dir {
        fs::create_dir_all(out_dir)?;
        config.output.run_directory = Some(out_dir.to_path_buf());
    }
    config.validate()?;
    Ok(config)
}

fn report(
    model: DemoModel,
    summary: &RunSummary,
    run_directory: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let payload = CliSummary {
        model: model.label(),
        stages: summary.stages,
        epsilons: &summary.epsilons,
        posterior_means: &summary.posterior_means,
        acceptance_rate: summary.diagnostics.acceptance_rate,
        trace_hash: &summary.trace_hash,
        run_directory,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    if let Some(dir) = run_directory {
        write_json(dir.join("summary.json"), summary)?;
    }
    println!("{json}");
    Ok(())
}

fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
