//! Figure organization: list, filter, classify, move, record.

pub mod plan;

pub use plan::{apply_move, MoveStatus, OrganizePlan, PlannedMove, Planner};

use crate::classify::Taxonomy;
use crate::config::Config;
use crate::error::{FigsyncError, Result, StepOutcome};
use crate::extract::MetadataExtractor;
use crate::recency::RecencyFilter;
use crate::store::MetadataStore;
use chrono::{Local, NaiveDateTime};
use globset::GlobSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub candidates: usize,
    pub recent: usize,
    pub widened: bool,
    pub moved: usize,
    pub skipped_existing: usize,
    /// Files left in the root because their name could not be read.
    pub skipped_unreadable: usize,
    /// Files placed per category, including skipped ones.
    pub per_category: BTreeMap<String, usize>,
    pub indexed: usize,
}

/// Files figures under the staging root and keeps the metadata store current.
pub struct Organizer {
    root: PathBuf,
    extractor: MetadataExtractor,
    taxonomy: Taxonomy,
    store: MetadataStore,
    images: GlobSet,
    widen_when_empty: bool,
    now: Option<NaiveDateTime>,
}

impl Organizer {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            root: config.staging_root.clone(),
            extractor: MetadataExtractor::new(&config.patterns)?,
            taxonomy: Taxonomy::new(config.categories.clone(), config.subcategories.clone()),
            store: MetadataStore::new(config.metadata_path()),
            images: config.image_matcher()?,
            widen_when_empty: config.organize.widen_when_empty,
            now: None,
        })
    }

    /// Pin the clock instead of reading local time on each pass.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Image files directly under the staging root, sorted by name.
    pub fn list_candidates(&self) -> Result<Vec<PathBuf>> {
        let listing_err =
            |source: std::io::Error| FigsyncError::Listing { path: self.root.clone(), source };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(listing_err)? {
            let entry = entry.map_err(listing_err)?;
            if !entry.file_type().map_err(listing_err)?.is_file() {
                continue;
            }
            if self.images.is_match(entry.file_name()) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Compute what a pass would do without touching the disk.
    pub fn plan(&self, days: u32) -> Result<OrganizePlan> {
        let candidates = self.list_candidates()?;
        let index = self.store.load();
        tracing::info!("Loaded metadata for {} files", index.len());
        Ok(self.planner(days).plan(&candidates, &index))
    }

    /// Run a full pass. Errors are logged and returned as a failed outcome;
    /// files moved before a failure stay where they are.
    pub fn organize(&self, days: u32) -> StepOutcome<OrganizeSummary> {
        StepOutcome::from_result("organize", self.try_organize(days))
    }

    pub fn try_organize(&self, days: u32) -> Result<OrganizeSummary> {
        self.ensure_category_dirs()?;

        let candidates = self.list_candidates()?;
        tracing::info!("Found {} image files to organize", candidates.len());

        let index = self.store.load();
        tracing::info!("Loaded metadata for {} files", index.len());

        let plan = self.planner(days).plan(&candidates, &index);

        let mut summary = OrganizeSummary {
            candidates: plan.total_candidates,
            recent: plan.recent_candidates,
            widened: plan.widened,
            skipped_unreadable: plan.unreadable_names.len(),
            ..OrganizeSummary::default()
        };

        for planned in &plan.moves {
            match apply_move(planned)? {
                MoveStatus::Moved => summary.moved += 1,
                MoveStatus::SkippedExisting => summary.skipped_existing += 1,
            }
            *summary.per_category.entry(planned.destination.category.clone()).or_default() += 1;
        }

        let merged = self.store.merge_and_save(&plan.metadata())?;
        summary.indexed = merged.len();

        tracing::info!(
            "Files organized successfully ({} moved, {} already in place)",
            summary.moved,
            summary.skipped_existing
        );
        Ok(summary)
    }

    fn planner(&self, days: u32) -> Planner<'_> {
        let now = self.now();
        Planner {
            root: &self.root,
            extractor: &self.extractor,
            taxonomy: &self.taxonomy,
            filter: RecencyFilter::new(days, now),
            now,
            widen_when_empty: self.widen_when_empty,
        }
    }

    fn ensure_category_dirs(&self) -> Result<()> {
        for name in self.taxonomy.category_names() {
            let path = self.root.join(name);
            fs::create_dir_all(&path).map_err(|source| FigsyncError::CreateDir { path, source })?;
        }
        Ok(())
    }
}
