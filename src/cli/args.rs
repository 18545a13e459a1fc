//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Launchpad - run token and NFT collection launches step by step.
#[derive(Debug, Parser)]
#[command(name = "launchpad")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output, including command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a launch plan
    Run(RunArgs),

    /// Show the steps a launch plan would run
    Plan(PlanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Path to the launch plan
    #[arg(value_name = "PLAN")]
    pub plan: PathBuf,

    /// Print commands without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Automatic retries of a failed step when running non-interactively
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub max_retries: u32,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Never prompt; failures are retried up to --max-retries, then abort
    #[arg(long)]
    pub non_interactive: bool,
}

impl RunArgs {
    pub fn new(plan: impl Into<PathBuf>) -> Self {
        Self {
            plan: plan.into(),
            dry_run: false,
            max_retries: 0,
            yes: false,
            non_interactive: false,
        }
    }
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    /// Path to the launch plan
    #[arg(value_name = "PLAN")]
    pub plan: PathBuf,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
