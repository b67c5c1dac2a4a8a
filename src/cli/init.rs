//! Init command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Args)]
pub struct InitArgs {
    /// Where to write the config file
    #[arg(short, long, value_name = "FILE", default_value = "figsync.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", args.output.display());
    }
    let text = Config::default().to_toml()?;
    fs::write(&args.output, text)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
