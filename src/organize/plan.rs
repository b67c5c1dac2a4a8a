//! Destination planning and application.

use crate::classify::{Destination, Taxonomy};
use crate::domain::{FigureMetadata, MetadataIndex};
use crate::error::{FigsyncError, Result};
use crate::extract::MetadataExtractor;
use crate::recency::RecencyFilter;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// One figure's move from the staging root into the category tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub target: PathBuf,
    pub destination: Destination,
    pub metadata: FigureMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizePlan {
    pub moves: Vec<PlannedMove>,
    pub total_candidates: usize,
    pub recent_candidates: usize,
    /// Every candidate was taken because none passed the recency filter.
    pub widened: bool,
    /// Working-set files left in place because their name is not valid UTF-8.
    pub unreadable_names: Vec<PathBuf>,
}

impl OrganizePlan {
    pub fn metadata(&self) -> Vec<FigureMetadata> {
        self.moves.iter().map(|m| m.metadata.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Moved,
    /// The target already existed and was left untouched.
    SkippedExisting,
}

/// Inputs shared by planning steps.
pub struct Planner<'a> {
    pub root: &'a Path,
    pub extractor: &'a MetadataExtractor,
    pub taxonomy: &'a Taxonomy,
    pub filter: RecencyFilter,
    pub now: NaiveDateTime,
    pub widen_when_empty: bool,
}

impl Planner<'_> {
    /// Choose the working set and a destination for each file in it.
    ///
    /// Reads nothing but file modification times (for files the index does
    /// not date), and writes nothing.
    pub fn plan(&self, candidates: &[PathBuf], index: &MetadataIndex) -> OrganizePlan {
        let recent: Vec<&PathBuf> =
            candidates.iter().filter(|path| self.filter.is_recent(path, index)).collect();
        let recent_candidates = recent.len();
        tracing::info!(
            "Filtered to {} recent files (cutoff {})",
            recent_candidates,
            self.filter.cutoff()
        );

        let widened = recent.is_empty() && !candidates.is_empty() && self.widen_when_empty;
        let working: Vec<&PathBuf> = if widened {
            tracing::warn!(
                "No recent files found with metadata dating. Including all {} files from current sync.",
                candidates.len()
            );
            candidates.iter().collect()
        } else {
            recent
        };

        let mut moves = Vec::new();
        let mut unreadable_names = Vec::new();
        for path in working {
            match self.plan_one(path) {
                Some(planned) => moves.push(planned),
                None => {
                    tracing::warn!("Skipping {}: filename is not valid UTF-8", path.display());
                    unreadable_names.push(path.clone());
                }
            }
        }

        OrganizePlan {
            moves,
            total_candidates: candidates.len(),
            recent_candidates,
            widened,
            unreadable_names,
        }
    }

    fn plan_one(&self, source: &Path) -> Option<PlannedMove> {
        let filename = source.file_name()?.to_str()?;
        let metadata = self.extractor.extract(filename, self.now);
        let destination = self.taxonomy.destination(&metadata);
        let target = self.root.join(destination.relative_path(filename));
        Some(PlannedMove { source: source.to_path_buf(), target, destination, metadata })
    }
}

/// Move one planned file, leaving an existing target in place.
pub fn apply_move(planned: &PlannedMove) -> Result<MoveStatus> {
    if planned.target.exists() {
        tracing::debug!(
            "{} already exists, leaving {} in place",
            planned.target.display(),
            planned.source.display()
        );
        return Ok(MoveStatus::SkippedExisting);
    }

    if let Some(parent) = planned.target.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| FigsyncError::CreateDir { path: parent.to_path_buf(), source })?;
    }

    move_file(&planned.source, &planned.target)?;
    Ok(MoveStatus::Moved)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    let move_err = |source: std::io::Error| FigsyncError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Cross-device targets cannot be renamed into.
    fs::copy(from, to).map_err(move_err)?;
    fs::remove_file(from).map_err(move_err)?;
    Ok(())
}
