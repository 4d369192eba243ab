use beach_profile_lib::{config::DEFAULT_CONFIG_FILE, planner::BatchPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "beach-profile",
    version,
    about = "Predict wave break points on surveyed beach profiles"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, help = "Configuration file")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render and upload one profile per (transect, wave height)
    Run(RunArgs),
    /// Print the breaking depth for a wave height
    BreakDepth(BreakDepthArgs),
    /// Show one transect as ASCII in the terminal
    Preview(PreviewArgs),
    /// Copy a local file into the configured bucket
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Object key of the survey profile CSV")]
    pub profile: String,

    #[arg(long, help = "Object key of the wave data CSV")]
    pub waves: String,

    #[arg(long, value_enum, help = "Override batch.policy from the config")]
    pub policy: Option<PolicyArg>,

    #[arg(long, default_value_t = false, help = "Evaluate units on a single thread")]
    pub sequential: bool,
}

#[derive(Debug, Args)]
pub struct BreakDepthArgs {
    #[arg(long, help = "Wave height in metres")]
    pub height: f64,

    #[arg(long, requires = "normal", help = "Wave direction in degrees (0 = North)")]
    pub direction: Option<f64>,

    #[arg(long, requires = "direction", help = "Coast normal direction in degrees")]
    pub normal: Option<f64>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[arg(long, help = "Local survey profile CSV")]
    pub profile: PathBuf,

    #[arg(long, help = "Wave height in metres")]
    pub height: f64,

    #[arg(long, default_value_t = 1, help = "1-based transect index")]
    pub transect: usize,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(long, help = "Local file to copy into the bucket")]
    pub file: PathBuf,

    #[arg(long, help = "Object key (defaults to the file name)")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Abort,
    Continue,
}

impl From<PolicyArg> for BatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => BatchPolicy::Abort,
            PolicyArg::Continue => BatchPolicy::Continue,
        }
    }
}
