//! Staging directory cleanup before a sync.

use crate::error::{FigsyncError, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub metadata_restored: bool,
}

/// Empty `root` except for `metadata_file` and any `preserved` names.
///
/// The metadata document is read into memory first and written back if the
/// cleanup left it missing or changed, so the index survives every cycle.
pub fn clean_staging(root: &Path, metadata_file: &str, preserved: &[&str]) -> Result<CleanSummary> {
    tracing::info!("Cleaning up local figures directory {}", root.display());

    if !root.exists() {
        fs::create_dir_all(root)
            .map_err(|source| FigsyncError::CreateDir { path: root.to_path_buf(), source })?;
        tracing::info!("Created local figures directory");
        return Ok(CleanSummary::default());
    }

    let metadata_path = root.join(metadata_file);
    let backup = match fs::read(&metadata_path) {
        Ok(bytes) => {
            tracing::info!("Backed up metadata file");
            Some(bytes)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(source) => return Err(FigsyncError::StoreRead { path: metadata_path, source }),
    };

    let keep: HashSet<OsString> = preserved
        .iter()
        .chain(std::iter::once(&metadata_file))
        .map(OsString::from)
        .collect();

    let clean_err = |source: std::io::Error| FigsyncError::Clean { path: root.to_path_buf(), source };
    let mut summary = CleanSummary::default();

    for entry in fs::read_dir(root).map_err(clean_err)? {
        let entry = entry.map_err(clean_err)?;
        let file_type = entry.file_type().map_err(clean_err)?;
        let path = entry.path();

        if file_type.is_dir() {
            fs::remove_dir_all(&path)
                .map_err(|source| FigsyncError::Clean { path: path.clone(), source })?;
            summary.dirs_removed += 1;
        } else if !keep.contains(&entry.file_name()) {
            fs::remove_file(&path)
                .map_err(|source| FigsyncError::Clean { path: path.clone(), source })?;
            summary.files_removed += 1;
        }
    }

    tracing::info!(
        "Cleaned up local figures directory ({} files, {} directories)",
        summary.files_removed,
        summary.dirs_removed
    );

    if let Some(bytes) = backup {
        let intact = fs::read(&metadata_path).map(|current| current == bytes).unwrap_or(false);
        if !intact {
            fs::write(&metadata_path, &bytes)
                .map_err(|source| FigsyncError::StoreWrite { path: metadata_path.clone(), source })?;
            summary.metadata_restored = true;
            tracing::info!("Restored metadata file");
        }
    }

    Ok(summary)
}
