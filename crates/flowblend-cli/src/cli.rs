use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

use flowblend_algo::{LpBackend, QualityBackend};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a case: allocate flows, then propagate composition
    Solve {
        /// Case file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Directory for the CSV tables and summary.json
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
        /// Summary output on stdout
        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Check a case for reference errors and suspicious data without solving
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },
    /// Network graph utilities
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// Plan several cases as independent scenarios
    Batch {
        /// Case files, one scenario each
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        cases: Vec<PathBuf>,
        /// Write each scenario's report under <OUT>/<case name>/
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Location, arc and component counts
    Stats {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// List weakly connected components
    Components {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// Export the topology (dot)
    Export {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        #[arg(long, default_value = "dot")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Solver settings shared by `solve` and `batch`. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SolverArgs {
    /// Plan config TOML with [flow], [quality] and [plan] sections
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// LP backend for flow allocation (clarabel, highs)
    #[arg(long)]
    pub lp_backend: Option<LpBackend>,
    /// Composition solver (penalty-lbfgs, direct)
    #[arg(long)]
    pub quality_backend: Option<QualityBackend>,
    /// Wall-clock budget for flow allocation, in seconds
    #[arg(long)]
    pub flow_timeout: Option<f64>,
    /// Wall-clock budget for quality propagation, in seconds
    #[arg(long)]
    pub quality_timeout: Option<f64>,
    /// Stop after flow allocation
    #[arg(long)]
    pub no_composition: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    #[default]
    Table,
    Json,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
