//! Configuration loading and merging
//!
//! Handles loading from config files and environment variables with proper
//! precedence (CLI > Env > File > Defaults). CLI overrides are applied by the
//! caller after loading.

pub mod loader;

pub use loader::load_config;

use crate::domain::DEFAULT_METADATA_FILE;
use crate::error::{FigsyncError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A primary category and the filename keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self { name: name.to_string(), keywords: keywords.iter().map(|k| k.to_string()).collect() }
    }
}

/// A named attribute pattern applied to filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    pub regex: String,
}

impl PatternRule {
    pub fn new(name: &str, regex: &str) -> Self {
        Self { name: name.to_string(), regex: regex.to_string() }
    }
}

pub fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "language_processing",
            &["mindsentences", "language", "semantic", "syntactic"],
        ),
        CategoryRule::new("eeg_analysis", &["eeg", "erp"]),
        CategoryRule::new("meg_analysis", &["meg", "event"]),
        CategoryRule::new("source_localization", &["source", "mne", "dics", "lcmv"]),
        CategoryRule::new("topographic_maps", &["topo", "map"]),
        CategoryRule::new("connectivity", &["connect", "network"]),
        CategoryRule::new("time_frequency", &["tf", "frequency", "power", "tfr"]),
    ]
}

pub fn default_patterns() -> Vec<PatternRule> {
    vec![
        PatternRule::new("subject", r"sub-([A-Za-z0-9]+)"),
        PatternRule::new("task", r"task-([A-Za-z0-9]+)"),
        PatternRule::new("condition", r"cond-([A-Za-z0-9]+)"),
        PatternRule::new("analysis_type", r"(meg|eeg|source|topo)"),
        PatternRule::new("component", r"(N[0-9]+|P[0-9]+)"),
        PatternRule::new("timestamp", r"([0-9]{8}T[0-9]{6})"),
    ]
}

pub fn default_subcategories() -> Vec<String> {
    ["subject", "task", "condition"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Process every file when the recency filter keeps none of them.
    pub widen_when_empty: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self { widen_when_empty: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// `user@host` passed to rsync. Empty disables syncing.
    pub host: String,
    pub path: String,
    pub skip_existing: bool,
    pub program: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            path: String::new(),
            skip_existing: false,
            program: "rsync".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.path.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub title: String,
    pub file_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            title: "MEG/EEG Analysis Report".to_string(),
            file_prefix: "mne_report".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Website repository checkout. `None` disables publishing.
    pub repo_path: Option<PathBuf>,
    pub files_dir: String,
    pub index_file: String,
    pub anchor: String,
    pub remote: String,
    pub branch: Option<String>,
    pub push: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            repo_path: None,
            files_dir: "files".to_string(),
            index_file: "index.html".to_string(),
            anchor: "<h2>Weekly Meetings</h2>".to_string(),
            remote: "origin".to_string(),
            branch: None,
            push: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Write run notifications to the log. No mail is sent; read them on
    /// stderr or in the `--log-file` output.
    pub enabled: bool,
    /// Addresses recorded alongside each logged notification.
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub staging_root: PathBuf,
    pub metadata_file: String,
    pub image_globs: Vec<String>,
    pub days: u32,
    pub subcategories: Vec<String>,
    pub organize: OrganizeConfig,
    pub remote: RemoteConfig,
    pub report: ReportConfig,
    pub site: SiteConfig,
    pub notify: NotifyConfig,
    // Arrays of tables stay last so the TOML form serializes cleanly.
    pub categories: Vec<CategoryRule>,
    pub patterns: Vec<PatternRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("figures"),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            image_globs: vec!["*.png".to_string()],
            days: 7,
            subcategories: default_subcategories(),
            organize: OrganizeConfig::default(),
            remote: RemoteConfig::default(),
            report: ReportConfig::default(),
            site: SiteConfig::default(),
            notify: NotifyConfig::default(),
            categories: default_categories(),
            patterns: default_patterns(),
        }
    }
}

impl Config {
    pub fn metadata_path(&self) -> PathBuf {
        self.staging_root.join(&self.metadata_file)
    }

    /// Compile the image globs into a matcher for bare filenames.
    pub fn image_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.image_globs {
            let glob = Glob::new(pattern)
                .map_err(|source| FigsyncError::Glob { glob: pattern.clone(), source })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|source| FigsyncError::Glob { glob: self.image_globs.join(","), source })
    }

    /// Extension of the first image glob (`*.png` → `png`), used to count
    /// transferred figures in sync output.
    pub fn primary_image_extension(&self) -> Option<&str> {
        self.image_globs
            .first()
            .and_then(|g| g.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && !ext.contains(['*', '?', '[']))
    }

    /// Render as a TOML document suitable for a starter `figsync.toml`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FigsyncError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.metadata_file.trim().is_empty() {
            return Err(FigsyncError::Config("metadata_file must not be empty".to_string()));
        }
        if self.image_globs.is_empty() {
            return Err(FigsyncError::Config("image_globs must not be empty".to_string()));
        }
        self.image_matcher()?;

        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(FigsyncError::Config("category names must not be empty".to_string()));
            }
            if category.name.contains(['/', '\\']) {
                return Err(FigsyncError::Config(format!(
                    "category name `{}` must not contain path separators",
                    category.name
                )));
            }
        }

        for pattern in &self.patterns {
            Regex::new(&pattern.regex)
                .map_err(|source| FigsyncError::Pattern { name: pattern.name.clone(), source })?;
        }

        for subcategory in &self.subcategories {
            if !self.patterns.iter().any(|p| &p.name == subcategory) {
                tracing::warn!(
                    "subcategory `{}` has no matching pattern and will never apply",
                    subcategory
                );
            }
        }

        Ok(())
    }
}
