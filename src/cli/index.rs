//! Index command implementation

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;

use super::utils::load_settings;
use super::GlobalArgs;
use crate::domain::{FigureMetadata, MetadataIndex};
use crate::recency::RecencyFilter;
use crate::store::MetadataStore;

#[derive(Args)]
pub struct IndexArgs {
    /// Only list entries that pass the recency filter
    #[arg(long)]
    pub recent: bool,

    /// Recency window used with --recent (defaults to `days` in config)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Print the selected entries as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: IndexArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_settings(global)?;
    let store = MetadataStore::new(config.metadata_path());
    let index = store
        .try_load()
        .with_context(|| format!("Failed to read metadata index {}", store.path().display()))?;

    let selected: MetadataIndex = if args.recent {
        let filter =
            RecencyFilter::new(args.days.unwrap_or(config.days), Local::now().naive_local());
        index
            .iter()
            .filter(|(name, _)| filter.is_recent(&config.staging_root.join(name), &index))
            .map(|(name, meta)| (name.clone(), meta.clone()))
            .collect()
    } else {
        index
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    let noun = if selected.len() == 1 { "entry" } else { "entries" };
    println!("{} {} in {}", selected.len(), noun, store.path().display());
    for meta in selected.values() {
        println!("{}", describe(meta));
    }
    Ok(())
}

fn describe(meta: &FigureMetadata) -> String {
    let mut line = format!("  {}", meta.filename);
    if let Some(added) = &meta.added_date {
        line.push_str(&format!("  [added {}]", added));
    }
    let attributes: Vec<String> =
        meta.attributes.iter().map(|(key, value)| format!("{}={}", key, value)).collect();
    if !attributes.is_empty() {
        line.push_str("  ");
        line.push_str(&attributes.join(" "));
    }
    line
}
