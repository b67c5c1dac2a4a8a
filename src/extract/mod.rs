//! Filename metadata extraction

use crate::config::{default_patterns, PatternRule};
use crate::domain::FigureMetadata;
use crate::error::{FigsyncError, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static DEFAULT_EXTRACTOR: Lazy<MetadataExtractor> = Lazy::new(|| {
    MetadataExtractor::new(&default_patterns()).expect("default patterns are valid")
});

struct AttributePattern {
    name: String,
    regex: Regex,
}

/// Extracts named attributes from figure filenames.
///
/// Patterns are tried in order and searched anywhere in the filename. The
/// first capture group becomes the value; a pattern without groups yields the
/// whole match.
pub struct MetadataExtractor {
    patterns: Vec<AttributePattern>,
}

impl MetadataExtractor {
    pub fn new(rules: &[PatternRule]) -> Result<Self> {
        let patterns = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.regex)
                    .map(|regex| AttributePattern { name: rule.name.clone(), regex })
                    .map_err(|source| FigsyncError::Pattern { name: rule.name.clone(), source })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Extractor built from the stock subject/task/condition/analysis_type/
    /// component/timestamp patterns.
    pub fn default_patterns() -> &'static MetadataExtractor {
        &DEFAULT_EXTRACTOR
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }

    pub fn extract(&self, filename: &str, now: NaiveDateTime) -> FigureMetadata {
        let mut metadata = FigureMetadata::new(filename, now);

        for pattern in &self.patterns {
            let Some(captures) = pattern.regex.captures(filename) else {
                continue;
            };
            let value = captures.get(1).or_else(|| captures.get(0)).map(|m| m.as_str());
            if let Some(value) = value {
                metadata.attributes.insert(pattern.name.clone(), value.to_string());
            }
        }

        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn extracts_all_default_attributes() {
        let meta = MetadataExtractor::default_patterns()
            .extract("sub-07_task-mindsentences_cond-A_meg_N100_20240101T120000.png", now());

        let expected: BTreeMap<String, String> = [
            ("subject", "07"),
            ("task", "mindsentences"),
            ("condition", "A"),
            ("analysis_type", "meg"),
            ("component", "N100"),
            ("timestamp", "20240101T120000"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        similar_asserts::assert_eq!(meta.attributes, expected);
        assert_eq!(meta.filename, "sub-07_task-mindsentences_cond-A_meg_N100_20240101T120000.png");
        assert_eq!(meta.added_date.as_deref(), Some("2024-03-01 09:30:00"));
    }

    #[test]
    fn no_match_yields_only_filename_and_date() {
        let meta = MetadataExtractor::default_patterns().extract("randomfile.png", now());
        assert!(meta.attributes.is_empty());
        assert_eq!(meta.filename, "randomfile.png");
        assert!(meta.added_date.is_some());
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = MetadataExtractor::default_patterns();
        let a = extractor.extract("sub-02_eeg_P300.png", now());
        let b = extractor.extract("sub-02_eeg_P300.png", now());
        assert_eq!(a, b);
    }

    #[test]
    fn pattern_without_group_stores_whole_match() {
        let extractor =
            MetadataExtractor::new(&[PatternRule::new("kind", r"evoked|epochs")]).unwrap();
        let meta = extractor.extract("sub-01_epochs.png", now());
        assert_eq!(meta.attribute("kind"), Some("epochs"));
    }

    #[test]
    fn analysis_type_is_case_sensitive() {
        let meta = MetadataExtractor::default_patterns().extract("MEG_overview.png", now());
        assert_eq!(meta.attribute("analysis_type"), None);
    }

    #[test]
    fn invalid_pattern_reports_name() {
        let err = MetadataExtractor::new(&[PatternRule::new("broken", "(")]).err().unwrap();
        assert!(err.to_string().contains("broken"));
    }
}
