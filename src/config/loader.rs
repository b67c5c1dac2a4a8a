//! Config file loading

use super::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "FIGSYNC_";

/// Load configuration from `config_path`, or from a config file discovered in
/// `search_dir`, layered over defaults and under `FIGSYNC_*` environment
/// variables.
///
/// An explicitly provided file must parse; an auto-discovered one that fails
/// to parse is reported and ignored.
pub fn load_config(search_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_dir),
    };

    let base = Figment::from(Serialized::defaults(Config::default()));

    let figment = match discovered {
        None => base,
        Some(config_file) => match file_layer(base.clone(), &config_file) {
            Ok(figment) => figment,
            Err(e) => {
                if config_path_provided {
                    return Err(e);
                }
                tracing::warn!(
                    "Failed to load auto-discovered config {}: {:#}",
                    config_file.display(),
                    e
                );
                base
            }
        },
    };

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Invalid configuration")?;

    Ok(config)
}

fn file_layer(base: Figment, config_file: &Path) -> Result<Figment> {
    let content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let figment = match ext.as_str() {
        "toml" => base.merge(Toml::string(&content)),
        "yaml" | "yml" => base.merge(Yaml::string(&content)),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    };

    // Surface type errors from the file itself, not later from the env layer.
    figment
        .extract::<Config>()
        .with_context(|| format!("Invalid config: {}", config_file.display()))?;

    Ok(figment)
}

fn discover_config(search_dir: &Path) -> Option<PathBuf> {
    let candidates = ["figsync.toml", ".figsync.toml", "figsync.yml", "figsync.yaml"];

    for candidate in candidates {
        let path = search_dir.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}
