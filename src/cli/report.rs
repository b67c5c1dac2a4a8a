//! Report command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{load_settings, parse_date};
use super::GlobalArgs;
use crate::report::{collect_report, write_report, HtmlReportRenderer};
use crate::store::MetadataStore;

#[derive(Args)]
pub struct ReportArgs {
    /// Report date in YYYY-MM-DD format (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Directory to write the report into (overrides `report.output_dir`)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReportArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_settings(global)?;
    let date = parse_date(args.date.as_deref());
    let output_dir = args.output.unwrap_or_else(|| config.report.output_dir.clone());

    let index = MetadataStore::new(config.metadata_path()).load();
    let images = config.image_matcher()?;
    let report = collect_report(&config.staging_root, &images, &index, &config.report.title, date)
        .context("Failed to collect figures")?;
    let path = write_report(&HtmlReportRenderer, &report, &output_dir, &config.report.file_prefix)
        .context("Failed to write report")?;

    println!("Report with {} figure(s) written to {}", report.total_figures, path.display());
    Ok(())
}
