//! Command-line interface for figsync
//!
//! `run` drives the whole pipeline; the other subcommands expose its steps
//! one at a time for manual use.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod clean;
mod cron;
mod index;
mod init;
mod organize;
mod report;
mod run;
mod sync;
mod utils;

/// Pull analysis figures from a cluster, file them by filename metadata, and publish a weekly report
#[derive(Parser)]
#[command(name = "figsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (TOML or YAML); otherwise figsync.toml is looked up in the working directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Staging directory holding synced figures (overrides `staging_root`)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also append plain-text logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync, organize, report and publish in one go
    Run(run::RunArgs),

    /// Clean the staging directory and pull fresh figures from the remote
    Sync(sync::SyncArgs),

    /// File recent figures into category directories and update the index
    Organize(organize::OrganizeArgs),

    /// Empty the staging directory, keeping the metadata index
    Clean(clean::CleanArgs),

    /// Render the HTML report for the staging directory
    Report(report::ReportArgs),

    /// List entries in the metadata index
    Index(index::IndexArgs),

    /// Install a daily cron entry that runs the pipeline
    Cron(cron::CronArgs),

    /// Write a starter figsync.toml with the default settings
    Init(init::InitArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.global)?;

    match cli.command {
        Commands::Run(args) => run::run(args, &cli.global),
        Commands::Sync(args) => sync::run(args, &cli.global),
        Commands::Organize(args) => organize::run(args, &cli.global),
        Commands::Clean(args) => clean::run(args, &cli.global),
        Commands::Report(args) => report::run(args, &cli.global),
        Commands::Index(args) => index::run(args, &cli.global),
        Commands::Cron(args) => cron::run(args),
        Commands::Init(args) => init::run(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "figsync", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn init_logging(global: &GlobalArgs) -> Result<()> {
    // RUST_LOG directives are combined with the level picked by the flags.
    let level = if global.verbose {
        Level::DEBUG
    } else if global.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let file_layer = match &global.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .try_init();
    Ok(())
}
