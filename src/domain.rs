//! Core domain types shared across the pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format of `added_date` values in the metadata document.
pub const ADDED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of `timestamp` attributes embedded in figure filenames.
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Category for figures that match no keyword.
pub const MISC_CATEGORY: &str = "misc";

/// Attribute holding the acquisition timestamp parsed from the filename.
pub const TIMESTAMP_ATTRIBUTE: &str = "timestamp";

/// Default metadata document name inside the staging root.
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

/// Advisory lock file name inside the staging root.
pub const LOCK_FILE_NAME: &str = ".figsync.lock";

/// Metadata extracted from a single figure filename.
///
/// Serialized flat, so a stored entry looks like
/// `{"filename": "...", "added_date": "...", "subject": "07"}`.
/// Attributes are only present when their pattern matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureMetadata {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl FigureMetadata {
    pub fn new(filename: impl Into<String>, added: NaiveDateTime) -> Self {
        Self {
            filename: filename.into(),
            added_date: Some(added.format(ADDED_DATE_FORMAT).to_string()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// `timestamp` attribute parsed as `YYYYMMDDTHHMMSS`, if present and valid.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.attribute(TIMESTAMP_ATTRIBUTE)?;
        NaiveDateTime::parse_from_str(raw, FILENAME_TIMESTAMP_FORMAT).ok()
    }

    /// `added_date` parsed as `YYYY-MM-DD HH:MM:SS`, if present and valid.
    pub fn parsed_added_date(&self) -> Option<NaiveDateTime> {
        let raw = self.added_date.as_deref()?;
        NaiveDateTime::parse_from_str(raw, ADDED_DATE_FORMAT).ok()
    }
}

/// Filename-keyed index persisted as the metadata document.
///
/// A `BTreeMap` keeps the serialized document stable across runs.
pub type MetadataIndex = BTreeMap<String, FigureMetadata>;
