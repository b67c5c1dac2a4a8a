//! Persistent metadata index.
//!
//! The index is a single JSON document mapping filename → metadata. Updates are
//! read-merge-write; the write goes to a temp file that is renamed over the
//! document so a crash never leaves a truncated index behind.

use crate::domain::{FigureMetadata, MetadataIndex};
use crate::error::{FigsyncError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index, degrading to an empty one on any failure.
    pub fn load(&self) -> MetadataIndex {
        match self.try_load() {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!("{err}; continuing without stored metadata");
                MetadataIndex::new()
            }
        }
    }

    /// Load the index. A missing document is an empty index, not an error.
    pub fn try_load(&self) -> Result<MetadataIndex> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MetadataIndex::new()),
            Err(source) => {
                return Err(FigsyncError::StoreRead { path: self.path.clone(), source })
            }
        };

        serde_json::from_str(&content)
            .map_err(|source| FigsyncError::StoreParse { path: self.path.clone(), source })
    }

    /// Merge `entries` into the stored index and persist the result.
    ///
    /// Later entries for the same filename win over earlier ones and over the
    /// stored state. `added_date` is the exception: once a filename has one,
    /// it is kept so recency stays anchored to first sight.
    ///
    /// A document that cannot be read is replaced rather than blocking the
    /// update.
    pub fn merge_and_save(&self, entries: &[FigureMetadata]) -> Result<MetadataIndex> {
        let mut index = self.load();
        merge_entries(&mut index, entries);
        self.save(&index)?;
        tracing::info!("Updated metadata database with {} entries", entries.len());
        Ok(index)
    }

    pub fn save(&self, index: &MetadataIndex) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| FigsyncError::StoreWrite {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(index)
            .map_err(|source| FigsyncError::StoreParse { path: self.path.clone(), source })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .map_err(|source| FigsyncError::StoreWrite { path: temp_path.clone(), source })?;
        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            FigsyncError::StoreWrite { path: self.path.clone(), source }
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Fold `entries` into `index` with the store's overwrite rules.
pub fn merge_entries(index: &mut MetadataIndex, entries: &[FigureMetadata]) {
    for entry in entries {
        let mut entry = entry.clone();
        if let Some(previous) = index.get(&entry.filename) {
            if previous.added_date.is_some() {
                entry.added_date = previous.added_date.clone();
            }
        }
        index.insert(entry.filename.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn entry(name: &str, added: NaiveDateTime, attrs: &[(&str, &str)]) -> FigureMetadata {
        let mut meta = FigureMetadata::new(name, added);
        for (k, v) in attrs {
            meta.attributes.insert(k.to_string(), v.to_string());
        }
        meta
    }

    #[test]
    fn load_missing_document_is_empty() {
        let tmp = TempDir::new().expect("tmp");
        let store = MetadataStore::new(tmp.path().join("metadata.json"));
        assert!(store.try_load().expect("load").is_empty());
    }

    #[test]
    fn load_corrupt_document_degrades_to_empty() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("metadata.json");
        fs::write(&path, "{not json").expect("write");
        let store = MetadataStore::new(&path);

        assert!(matches!(store.try_load(), Err(FigsyncError::StoreParse { .. })));
        assert!(store.load().is_empty());
    }

    #[test]
    fn merge_persists_and_returns_index() {
        let tmp = TempDir::new().expect("tmp");
        let store = MetadataStore::new(tmp.path().join("metadata.json"));

        let merged = store
            .merge_and_save(&[entry("a.png", day(1), &[("subject", "01")])])
            .expect("merge");
        assert_eq!(merged.len(), 1);

        let reloaded = store.try_load().expect("reload");
        assert_eq!(reloaded, merged);
        assert!(!tmp.path().join("metadata.json.tmp").exists());
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tmp");
        let store = MetadataStore::new(tmp.path().join("metadata.json"));
        let batch = vec![
            entry("a.png", day(1), &[("subject", "01")]),
            entry("b.png", day(1), &[("task", "rest")]),
        ];

        let once = store.merge_and_save(&batch).expect("first");
        let twice = store.merge_and_save(&batch).expect("second");
        similar_asserts::assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn batch_overrides_attributes_but_keeps_first_added_date() {
        let tmp = TempDir::new().expect("tmp");
        let store = MetadataStore::new(tmp.path().join("metadata.json"));
        store.merge_and_save(&[entry("a.png", day(1), &[("subject", "01")])]).expect("first");

        let merged = store
            .merge_and_save(&[entry("a.png", day(9), &[("subject", "02")])])
            .expect("second");

        let a = &merged["a.png"];
        assert_eq!(a.attribute("subject"), Some("02"));
        assert_eq!(a.parsed_added_date(), Some(day(1)));
    }

    #[test]
    fn last_entry_in_batch_wins() {
        let mut index = MetadataIndex::new();
        merge_entries(
            &mut index,
            &[
                entry("a.png", day(1), &[("task", "first")]),
                entry("a.png", day(1), &[("task", "second")]),
            ],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index["a.png"].attribute("task"), Some("second"));
    }

    #[test]
    fn stored_entries_are_never_dropped() {
        let tmp = TempDir::new().expect("tmp");
        let store = MetadataStore::new(tmp.path().join("metadata.json"));
        store.merge_and_save(&[entry("old.png", day(1), &[])]).expect("first");

        let merged = store.merge_and_save(&[entry("new.png", day(2), &[])]).expect("second");
        assert!(merged.contains_key("old.png"));
        assert!(merged.contains_key("new.png"));
    }

    #[test]
    fn reads_documents_with_extra_keys() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("metadata.json");
        fs::write(
            &path,
            r#"{"x.png": {"filename": "x.png", "added_date": "2024-05-01 08:00:00", "component": "N400"}}"#,
        )
        .expect("write");

        let index = MetadataStore::new(&path).try_load().expect("load");
        assert_eq!(index["x.png"].attribute("component"), Some("N400"));
    }
}
