//! Publishing reports to the group website repository.
//!
//! A report is copied under a per-week directory, a meeting block linking to
//! it is inserted into the site index, and the result is committed (and
//! optionally pushed) with `git2`.

use crate::config::SiteConfig;
use crate::domain::MetadataIndex;
use crate::error::{FigsyncError, Result};
use chrono::{Datelike, NaiveDate};
use git2::{Commit, Cred, IndexAddOption, PushOptions, RemoteCallbacks, Repository, Signature};
use maud::html;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// `week{iso_week}_{year}`, e.g. `week6_2024`.
pub fn week_directory(date: NaiveDate) -> String {
    format!("week{}_{}", date.iso_week().week(), date.year())
}

/// Counts shown in the meeting block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub figures: usize,
    pub subjects: usize,
    pub tasks: usize,
}

impl IndexSummary {
    /// Entries without a subject or task count as one `unknown` value each.
    pub fn from_index(index: &MetadataIndex) -> Self {
        let subjects: BTreeSet<&str> =
            index.values().map(|m| m.attribute("subject").unwrap_or("unknown")).collect();
        let tasks: BTreeSet<&str> =
            index.values().map(|m| m.attribute("task").unwrap_or("unknown")).collect();
        Self { figures: index.len(), subjects: subjects.len(), tasks: tasks.len() }
    }
}

/// The meeting block linking to a published report.
pub fn index_section(
    date: NaiveDate,
    week_dir: &str,
    report_filename: &str,
    summary: &IndexSummary,
) -> String {
    let href = format!("files/{}/{}", week_dir, report_filename);
    let markup = html! {
        div class="meeting-section" {
            div class="meeting-date" { (date.format("%A, %B %d, %Y").to_string()) }
            h3 { "MEG/EEG Analysis Update" }
            p {
                "This update includes the latest MEG and EEG analyses with "
                (summary.figures) " figures from " (summary.subjects) " subjects across "
                (summary.tasks) " tasks. The report includes preprocessing results, "
                "source localization, and statistical analyses."
            }
            div class="meeting-files" {
                h4 { "Files:" }
                a href=(href) class="file-link" { "MNE Analysis Report" }
            }
        }
    };
    markup.into_string()
}

/// Insert `section` on a new line right after the first `anchor`.
///
/// Returns `None` when the anchor is absent.
pub fn insert_after_anchor(content: &str, anchor: &str, section: &str) -> Option<String> {
    let at = content.find(anchor)? + anchor.len();
    let mut updated = String::with_capacity(content.len() + section.len() + 1);
    updated.push_str(&content[..at]);
    updated.push('\n');
    updated.push_str(section);
    updated.push_str(&content[at..]);
    Some(updated)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Copy of the report inside the site repository.
    pub published_path: PathBuf,
    /// Path relative to the site root, as linked from the index.
    pub site_link: String,
    pub index_updated: bool,
    pub commit: String,
    pub pushed: bool,
}

pub struct SitePublisher {
    repo_path: PathBuf,
    files_dir: String,
    index_file: String,
    anchor: String,
    remote: String,
    branch: Option<String>,
    push: bool,
}

impl SitePublisher {
    pub fn from_config(site: &SiteConfig) -> Result<Self> {
        let repo_path = site
            .repo_path
            .clone()
            .ok_or_else(|| FigsyncError::Config("site.repo_path is not set".to_string()))?;
        Ok(Self {
            repo_path,
            files_dir: site.files_dir.clone(),
            index_file: site.index_file.clone(),
            anchor: site.anchor.clone(),
            remote: site.remote.clone(),
            branch: site.branch.clone(),
            push: site.push,
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn publish(
        &self,
        report_path: &Path,
        date: NaiveDate,
        index: &MetadataIndex,
    ) -> Result<PublishOutcome> {
        let week_dir = week_directory(date);
        let target_dir = self.repo_path.join(&self.files_dir).join(&week_dir);
        fs::create_dir_all(&target_dir)
            .map_err(|source| FigsyncError::CreateDir { path: target_dir.clone(), source })?;

        let report_filename = report_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FigsyncError::Report(format!("invalid report path {}", report_path.display()))
            })?
            .to_string();
        let published_path = target_dir.join(&report_filename);
        fs::copy(report_path, &published_path).map_err(|e| {
            FigsyncError::io(format!("failed to copy report to {}", published_path.display()), e)
        })?;

        let section = index_section(date, &week_dir, &report_filename, &IndexSummary::from_index(index));
        let index_updated = self.update_index(&section)?;

        let message = format!("Update with MEG/EEG report for {}", date.format("%Y-%m-%d"));
        let repo = Repository::open(&self.repo_path).map_err(|e| self.git_err(e))?;
        let commit = self.commit_all(&repo, &message)?;
        tracing::info!("Committed {} to {}", commit, self.repo_path.display());

        if self.push {
            self.push_branch(&repo)?;
            tracing::info!("Changes pushed to {}", self.remote);
        }

        Ok(PublishOutcome {
            published_path,
            site_link: format!("{}/{}/{}", self.files_dir, week_dir, report_filename),
            index_updated,
            commit,
            pushed: self.push,
        })
    }

    fn update_index(&self, section: &str) -> Result<bool> {
        let index_path = self.repo_path.join(&self.index_file);
        let content = fs::read_to_string(&index_path)
            .map_err(|e| FigsyncError::io(format!("failed to read {}", index_path.display()), e))?;

        match insert_after_anchor(&content, &self.anchor, section) {
            Some(updated) => {
                fs::write(&index_path, updated).map_err(|e| {
                    FigsyncError::io(format!("failed to write {}", index_path.display()), e)
                })?;
                tracing::info!("Updated {} with new report link", self.index_file);
                Ok(true)
            }
            None => {
                tracing::warn!(
                    "Could not find `{}` in {}, index left unchanged",
                    self.anchor,
                    self.index_file
                );
                Ok(false)
            }
        }
    }

    fn commit_all(&self, repo: &Repository, message: &str) -> Result<String> {
        let git_err = |e: git2::Error| self.git_err(e);

        let mut index = repo.index().map_err(git_err)?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).map_err(git_err)?;
        index.write().map_err(git_err)?;
        let tree_id = index.write_tree().map_err(git_err)?;
        let tree = repo.find_tree(tree_id).map_err(git_err)?;

        // Unconfigured user.name / user.email falls back to a fixed identity.
        let signature = match repo.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now("figsync", "figsync@localhost").map_err(git_err)?,
        };

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(git_err)?),
            Err(_) => None,
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(git_err)?;
        Ok(oid.to_string())
    }

    fn push_branch(&self, repo: &Repository) -> Result<()> {
        let git_err = |e: git2::Error| self.git_err(e);

        let branch = match &self.branch {
            Some(branch) => branch.clone(),
            None => {
                let head = repo.head().map_err(git_err)?;
                head.shorthand()
                    .ok_or_else(|| FigsyncError::Config("HEAD is not on a branch".to_string()))?
                    .to_string()
            }
        };

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, username, _allowed| {
            Cred::ssh_key_from_agent(username.unwrap_or("git"))
        });
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        let mut remote = repo.find_remote(&self.remote).map_err(git_err)?;
        remote.push(&[refspec.as_str()], Some(&mut options)).map_err(git_err)
    }

    fn git_err(&self, source: git2::Error) -> FigsyncError {
        FigsyncError::Git { repo: self.repo_path.clone(), source }
    }
}
