//! Error types and step outcomes.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FigsyncError {
    #[error("failed to read metadata store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata store {path} is not valid JSON: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write metadata store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clean {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is locked by another run")]
    Locked { path: PathBuf },

    #[error("failed to launch {program}: {source}")]
    SyncLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sync from {remote} failed ({status}): {stderr}")]
    SyncFailed { remote: String, status: String, stderr: String },

    #[error("no remote source configured")]
    NoRemote,

    #[error("invalid pattern `{name}`: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid image glob `{glob}`: {source}")]
    Glob {
        glob: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("git error in {repo}: {source}")]
    Git {
        repo: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FigsyncError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, FigsyncError>;

/// Result of a pipeline step at the boundary where errors stop propagating.
///
/// Steps never return `Err` to the orchestrator; a failure is carried as a
/// value so the scheduler that runs the pipeline is never brought down.
#[derive(Debug)]
pub enum StepOutcome<T> {
    Ok(T),
    RecoverableFailure(FigsyncError),
}

impl<T> StepOutcome<T> {
    /// Convert a step result, logging the failure under `step`.
    pub fn from_result(step: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => {
                tracing::error!(step, error = %err, "step failed");
                Self::RecoverableFailure(err)
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::RecoverableFailure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::RecoverableFailure(err) => Err(err),
        }
    }
}
