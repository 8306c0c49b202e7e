use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use env_logger::{Builder, Env};
use log::error;
use std::path::PathBuf;

mod runner;

/// Explain a flag detection stage by stage
#[derive(Parser, Debug)]
#[command(name = "flagscope")]
#[command(about = "Step-by-step explainability calculations for flag detections")]
pub struct Cli {
    /// Images to analyze
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// JSON response of the detection service (`{"predictions": [...]}`)
    #[arg(short, long)]
    pub predictions: Option<PathBuf>,

    /// Flag catalog replacing the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// JSON file overriding calculation constants
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

fn main() {
    let cli = Cli::parse();

    // If user didn't pass -v/-q and RUST_LOG is set, honor the env var.
    let use_env = !cli.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();
    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut builder = Builder::new();
        builder.filter_level(cli.verbosity.log_level_filter());
        builder
    };
    logger.format_timestamp(None).init();

    if let Err(e) = runner::run(&cli) {
        error!("Calculation failed: {e:#}");
        std::process::exit(1);
    }
}
