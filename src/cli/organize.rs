//! Organize command implementation

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use super::utils::load_settings;
use super::GlobalArgs;
use crate::organize::Organizer;

#[derive(Args)]
pub struct OrganizeArgs {
    /// Consider files recent within this many days (defaults to `days` in config)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Print the planned moves without touching the disk
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: OrganizeArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_settings(global)?;
    let days = args.days.unwrap_or(config.days);
    let organizer = Organizer::from_config(&config)?;

    if args.dry_run {
        let plan = organizer.plan(days).context("Failed to plan organization")?;
        println!(
            "{} {} of {} candidate(s) would be filed{}",
            style("Plan:").bold(),
            plan.moves.len(),
            plan.total_candidates,
            if plan.widened { " (no recent files, taking all)" } else { "" }
        );
        for planned in &plan.moves {
            let relative = planned.target.strip_prefix(organizer.root()).unwrap_or(&planned.target);
            println!("  {} -> {}", planned.metadata.filename, relative.display());
        }
        return Ok(());
    }

    let summary = organizer.organize(days).into_result().context("Organization failed")?;

    println!("{}", style("Organized figures").bold());
    println!("  Candidates: {}", summary.candidates);
    println!("  Recent: {}{}", summary.recent, if summary.widened { " (widened to all)" } else { "" });
    println!("  Moved: {}", summary.moved);
    println!("  Already in place: {}", summary.skipped_existing);
    if summary.skipped_unreadable > 0 {
        println!("  Unreadable names left in place: {}", summary.skipped_unreadable);
    }
    for (category, count) in &summary.per_category {
        println!("    {}: {}", category, count);
    }
    println!("  Indexed entries: {}", summary.indexed);
    Ok(())
}
