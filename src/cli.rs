use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Univariate-treatment Kalman smoother.
#[derive(Parser)]
#[command(
    name = "ksmooth",
    version,
    about = "Kalman filter and smoother for linear Gaussian state-space models"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Filter and smooth the configured observations.
    Smooth(SmoothArgs),
}

/// Arguments for the `smooth` subcommand.
#[derive(clap::Args)]
pub struct SmoothArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "ksmooth.toml")]
    pub config: PathBuf,

    /// Override output JSON path from config (stdout if neither is set).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override precision from config (`single` or `double`).
    #[arg(short, long)]
    pub precision: Option<String>,
}
