//! Run command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{load_settings, parse_date};
use super::GlobalArgs;
use crate::pipeline::{Pipeline, RunOptions};

#[derive(Args)]
pub struct RunArgs {
    /// Consider files recent within this many days (defaults to `days` in config)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Report date in YYYY-MM-DD format (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Generate the report but skip publishing to the website repository
    #[arg(long)]
    pub no_publish: bool,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_settings(global)?;
    let options = RunOptions {
        days: args.days.unwrap_or(config.days),
        date: parse_date(args.date.as_deref()),
        publish: !args.no_publish,
    };

    let report = Pipeline::from_config(&config).run(&options);

    if let Some(path) = &report.report_path {
        println!("Report: {}", path.display());
    }
    if let Some(outcome) = &report.publish {
        println!("Published: {} ({})", outcome.site_link, &outcome.commit[..outcome.commit.len().min(8)]);
    }

    match report.failed_step {
        None => Ok(()),
        Some(step) => anyhow::bail!("Pipeline failed at the {} step", step),
    }
}
