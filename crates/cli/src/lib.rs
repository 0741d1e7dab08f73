//! streampref CLI -- generate synthetic record streams and drive the
//! preference engine over them.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "streampref",
    about = "Continuous preference queries over relational streams"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate random record-stream runs
    Generate(GenerateArgs),
    /// Replay generated runs through the preference engine
    Run(RunArgs),
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Number of runs to generate
    #[arg(long)]
    pub n_run: u64,
    /// Number of integer attributes per record
    #[arg(long)]
    pub n_attribute: u64,
    /// Number of ticks per run
    #[arg(long)]
    pub n_tick: u64,
    /// Number of records per tick
    #[arg(long)]
    pub n_record_per_tick: u64,
    /// Upper bound (exclusive) of the sampled attribute values
    #[arg(long)]
    pub value_range: i64,
    /// Output directory for generated run files
    #[arg(long)]
    pub output_dir: PathBuf,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Input directory containing run JSON files
    #[arg(long)]
    pub input_dir: PathBuf,
    /// Which attribute the demo preference prefers smaller values of
    #[arg(long, default_value = "a0")]
    pub preferred_attribute: String,
    /// Best/top-k algorithm to drive the preference operator with
    #[arg(long, value_enum, default_value_t = PreferenceAlgorithmArg::Partition)]
    pub algorithm: PreferenceAlgorithmArg,
    /// `top > 0` requests a top-k list of that size; any other value
    /// requests the dominant (best) set
    #[arg(long, default_value_t = -1)]
    pub top: i64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PreferenceAlgorithmArg {
    DepthSearch,
    Partition,
    IncAncestors,
    IncPartition,
    IncGraph,
}

impl std::fmt::Display for PreferenceAlgorithmArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DepthSearch => "depth-search",
            Self::Partition => "partition",
            Self::IncAncestors => "inc-ancestors",
            Self::IncPartition => "inc-partition",
            Self::IncGraph => "inc-graph",
        };
        f.write_str(s)
    }
}

impl From<PreferenceAlgorithmArg> for streampref_core::operator::PreferenceAlgorithm {
    fn from(arg: PreferenceAlgorithmArg) -> Self {
        match arg {
            PreferenceAlgorithmArg::DepthSearch => Self::DepthSearch,
            PreferenceAlgorithmArg::Partition => Self::Partition,
            PreferenceAlgorithmArg::IncAncestors => Self::IncAncestors,
            PreferenceAlgorithmArg::IncPartition => Self::IncPartition,
            PreferenceAlgorithmArg::IncGraph => Self::IncGraph,
        }
    }
}
