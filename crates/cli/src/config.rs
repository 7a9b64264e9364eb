//! CLI configuration utilities

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tether_core::EndpointConfig;

/// Pick the data directory: explicit flag or `TETHER_STATE_DIR`, else the platform data dir
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    ProjectDirs::from("", "", "tether")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("no home directory to derive a data directory from; pass --data-dir")
}

/// Load endpoints from `.env`, the optional config file and `TETHER_*` variables
pub fn load_endpoints(config_file: Option<&Path>) -> Result<EndpointConfig> {
    EndpointConfig::from_env_with_file(config_file).with_context(|| match config_file {
        Some(path) => format!("loading endpoints from {}", path.display()),
        None => "loading endpoints from the environment (set TETHER_API_URL)".to_string(),
    })
}

/// Split a `key=value` argument
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}
