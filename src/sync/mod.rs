//! Pulling figures from the remote cluster.

use crate::clean::clean_staging;
use crate::config::{Config, RemoteConfig};
use crate::domain::LOCK_FILE_NAME;
use crate::error::{FigsyncError, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Figure files named in the transfer output.
    pub transferred: usize,
}

/// A place figures can be pulled from into a local directory.
pub trait FigureSource {
    fn describe(&self) -> String;
    fn pull(&self, dest: &Path) -> Result<SyncReport>;
}

/// `rsync -vr --progress [--ignore-existing] <host>:<path> <dest>`
pub struct RsyncSource {
    program: String,
    host: String,
    remote_path: String,
    skip_existing: bool,
    extension: Option<String>,
}

impl RsyncSource {
    pub fn from_config(remote: &RemoteConfig, extension: Option<&str>) -> Result<Self> {
        if !remote.is_configured() {
            return Err(FigsyncError::NoRemote);
        }
        Ok(Self {
            program: remote.program.clone(),
            host: remote.host.clone(),
            remote_path: remote.path.clone(),
            skip_existing: remote.skip_existing,
            extension: extension.map(str::to_string),
        })
    }

    fn remote_spec(&self) -> String {
        format!("{}:{}", self.host, self.remote_path)
    }

    pub fn args(&self, dest: &Path) -> Vec<String> {
        let mut args = vec!["-vr".to_string(), "--progress".to_string()];
        if self.skip_existing {
            args.push("--ignore-existing".to_string());
        }
        args.push(self.remote_spec());
        let mut dest = dest.to_string_lossy().into_owned();
        // rsync copies the remote directory's contents only with a trailing slash.
        if !dest.ends_with('/') {
            dest.push('/');
        }
        args.push(dest);
        args
    }
}

impl FigureSource for RsyncSource {
    fn describe(&self) -> String {
        self.remote_spec()
    }

    fn pull(&self, dest: &Path) -> Result<SyncReport> {
        tracing::info!("Syncing figures from {}", self.remote_spec());
        let output = Command::new(&self.program)
            .args(self.args(dest))
            .output()
            .map_err(|source| FigsyncError::SyncLaunch { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(FigsyncError::SyncFailed {
                remote: self.remote_spec(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let transferred = match &self.extension {
            Some(ext) => count_transferred(&stdout, ext),
            None => 0,
        };
        tracing::info!("Sync complete! Synced {} figure(s)", transferred);
        Ok(SyncReport { transferred })
    }
}

/// Count output lines naming a file with `extension`.
pub fn count_transferred(output: &str, extension: &str) -> usize {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    output.lines().filter(|line| line.trim_end().ends_with(&suffix)).count()
}

/// Clean the staging root, then pull fresh figures into it.
///
/// A failed cleanup is logged and the sync goes ahead anyway.
pub fn sync_figures(source: &dyn FigureSource, config: &Config) -> Result<SyncReport> {
    let root = &config.staging_root;
    if let Err(err) = clean_staging(root, &config.metadata_file, &[LOCK_FILE_NAME]) {
        tracing::warn!("Failed to clean local directory, continuing with sync: {err}");
    }

    fs::create_dir_all(root)
        .map_err(|source| FigsyncError::CreateDir { path: root.clone(), source })?;

    source.pull(root)
}
