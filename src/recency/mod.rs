//! Recency filtering.
//!
//! Syncing rewrites modification times, so stored metadata is preferred over
//! the filesystem when deciding whether a figure belongs to the current window.

use crate::domain::MetadataIndex;
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use std::fs;
use std::path::Path;

/// Which signal decided a recency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyBasis {
    /// `timestamp` attribute from the filename.
    Timestamp,
    /// `added_date` recorded at first sight.
    AddedDate,
    /// File modification time.
    Modified,
    /// The check itself failed; the file is included.
    FailOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyDecision {
    pub recent: bool,
    pub basis: RecencyBasis,
}

#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    cutoff: NaiveDateTime,
}

impl RecencyFilter {
    /// A window reaching past the earliest representable date keeps everything.
    pub fn new(days: u32, now: NaiveDateTime) -> Self {
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDateTime::MIN);
        Self { cutoff }
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    pub fn is_recent(&self, path: &Path, index: &MetadataIndex) -> bool {
        self.evaluate(path, index).recent
    }

    pub fn evaluate(&self, path: &Path, index: &MetadataIndex) -> RecencyDecision {
        let entry = path.file_name().and_then(|n| n.to_str()).and_then(|name| index.get(name));

        if let Some(meta) = entry {
            if let Some(timestamp) = meta.parsed_timestamp() {
                return RecencyDecision {
                    recent: timestamp >= self.cutoff,
                    basis: RecencyBasis::Timestamp,
                };
            }
            if let Some(added) = meta.parsed_added_date() {
                return RecencyDecision {
                    recent: added >= self.cutoff,
                    basis: RecencyBasis::AddedDate,
                };
            }
        }

        match modified_time(path) {
            Ok(modified) => {
                RecencyDecision { recent: modified >= self.cutoff, basis: RecencyBasis::Modified }
            }
            Err(err) => {
                tracing::error!("Error checking if {} is recent: {}", path.display(), err);
                RecencyDecision { recent: true, basis: RecencyBasis::FailOpen }
            }
        }
    }
}

fn modified_time(path: &Path) -> std::io::Result<NaiveDateTime> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FigureMetadata, TIMESTAMP_ATTRIBUTE};
    use std::fs::File;
    use std::time::{Duration as StdDuration, SystemTime};
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn index_with(meta: FigureMetadata) -> MetadataIndex {
        let mut index = MetadataIndex::new();
        index.insert(meta.filename.clone(), meta);
        index
    }

    #[test]
    fn stale_added_date_is_not_recent() {
        let now = now();
        let meta = FigureMetadata::new("a.png", now - Duration::days(10));
        let filter = RecencyFilter::new(7, now);

        let decision = filter.evaluate(Path::new("/nowhere/a.png"), &index_with(meta));
        assert_eq!(decision, RecencyDecision { recent: false, basis: RecencyBasis::AddedDate });
    }

    #[test]
    fn timestamp_takes_precedence_over_added_date() {
        let now = now();
        let mut meta = FigureMetadata::new("a.png", now - Duration::days(10));
        let stamp = (now - Duration::days(1)).format("%Y%m%dT%H%M%S").to_string();
        meta.attributes.insert(TIMESTAMP_ATTRIBUTE.to_string(), stamp);
        let filter = RecencyFilter::new(7, now);

        let decision = filter.evaluate(Path::new("/nowhere/a.png"), &index_with(meta));
        assert_eq!(decision, RecencyDecision { recent: true, basis: RecencyBasis::Timestamp });
    }

    #[test]
    fn unparseable_timestamp_falls_through_to_added_date() {
        let now = now();
        let mut meta = FigureMetadata::new("a.png", now - Duration::days(2));
        meta.attributes.insert(TIMESTAMP_ATTRIBUTE.to_string(), "20249999T999999".to_string());
        let filter = RecencyFilter::new(7, now);

        let decision = filter.evaluate(Path::new("/nowhere/a.png"), &index_with(meta));
        assert_eq!(decision, RecencyDecision { recent: true, basis: RecencyBasis::AddedDate });
    }

    #[test]
    fn unknown_file_uses_modification_time() {
        let tmp = TempDir::new().expect("tmp");
        let fresh = tmp.path().join("fresh.png");
        File::create(&fresh).expect("create");

        let old = tmp.path().join("old.png");
        let file = File::create(&old).expect("create");
        let thirty_days = StdDuration::from_secs(30 * 24 * 3600);
        file.set_modified(SystemTime::now() - thirty_days).expect("set mtime");

        let filter = RecencyFilter::new(7, now());
        let index = MetadataIndex::new();
        assert_eq!(
            filter.evaluate(&fresh, &index),
            RecencyDecision { recent: true, basis: RecencyBasis::Modified }
        );
        assert_eq!(
            filter.evaluate(&old, &index),
            RecencyDecision { recent: false, basis: RecencyBasis::Modified }
        );
    }

    #[test]
    fn entry_without_dates_uses_modification_time() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("a.png");
        File::create(&path).expect("create");
        let mut meta = FigureMetadata::new("a.png", now());
        meta.added_date = None;

        let decision = RecencyFilter::new(7, now()).evaluate(&path, &index_with(meta));
        assert_eq!(decision.basis, RecencyBasis::Modified);
        assert!(decision.recent);
    }

    #[test]
    fn missing_file_without_metadata_fails_open() {
        let tmp = TempDir::new().expect("tmp");
        let filter = RecencyFilter::new(7, now());

        let decision = filter.evaluate(&tmp.path().join("gone.png"), &MetadataIndex::new());
        assert_eq!(decision, RecencyDecision { recent: true, basis: RecencyBasis::FailOpen });
    }

    #[test]
    fn zero_days_keeps_only_future_or_current() {
        let now = now();
        let meta = FigureMetadata::new("a.png", now - Duration::seconds(5));
        let filter = RecencyFilter::new(0, now);
        assert!(!filter.is_recent(Path::new("a.png"), &index_with(meta)));
    }

    #[test]
    fn huge_window_saturates_instead_of_overflowing() {
        let now = now();
        let filter = RecencyFilter::new(u32::MAX, now);
        assert_eq!(filter.cutoff(), NaiveDateTime::MIN);

        let meta = FigureMetadata::new("a.png", now - Duration::days(3650));
        assert!(filter.is_recent(Path::new("a.png"), &index_with(meta)));
    }
}
