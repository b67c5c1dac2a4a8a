//! Clean command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::utils::load_settings;
use super::GlobalArgs;
use crate::clean::clean_staging;
use crate::domain::LOCK_FILE_NAME;

#[derive(Args)]
pub struct CleanArgs {}

pub fn run(_args: CleanArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_settings(global)?;
    let summary = clean_staging(&config.staging_root, &config.metadata_file, &[LOCK_FILE_NAME])
        .with_context(|| format!("Failed to clean {}", config.staging_root.display()))?;

    println!(
        "Removed {} file(s) and {} folder(s) from {}",
        summary.files_removed,
        summary.dirs_removed,
        config.staging_root.display()
    );
    Ok(())
}
