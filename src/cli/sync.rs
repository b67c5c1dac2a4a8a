//! Sync command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::utils::load_settings;
use super::GlobalArgs;
use crate::sync::{sync_figures, FigureSource, RsyncSource};

#[derive(Args)]
pub struct SyncArgs {
    /// Pass --ignore-existing to rsync regardless of config
    #[arg(long)]
    pub skip_existing: bool,
}

pub fn run(args: SyncArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_settings(global)?;
    if args.skip_existing {
        config.remote.skip_existing = true;
    }

    let source = RsyncSource::from_config(&config.remote, config.primary_image_extension())
        .context("Set [remote] host and path in the config file to sync")?;
    let report = sync_figures(&source, &config)
        .with_context(|| format!("Sync from {} failed", source.describe()))?;

    println!("Synced {} figure(s) into {}", report.transferred, config.staging_root.display());
    Ok(())
}
