// src/config.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Storage backend behind the set commands.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sled,
    Memory,
}

/// Server configuration, read from a JSON file at startup.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Address the RESP listener binds to
    pub bind: String,
    pub backend: Backend,
    /// sled database directory (sled backend only)
    pub data_dir: PathBuf,
    /// Number of shards in the per-key lock table
    pub lock_shards: usize,
    // 监控配置
    pub metrics_enabled: bool,
    pub metrics_port: u16,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:6380".into(),
            backend: Backend::Sled,
            data_dir: PathBuf::from("data"),
            lock_shards: crate::lock::DEFAULT_SHARDS,
            metrics_enabled: false,
            metrics_port: 9090,
            log_level: "info".into(),
        }
    }
}

/// Read and deserialize the JSON config at `path`.
///
/// A missing file is created with the default configuration.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        let default_cfg = Config::default();
        let default_json = serde_json::to_string_pretty(&default_cfg)?;
        fs::write(path_ref, default_json)
            .with_context(|| format!("Failed to write default config {:?}", path_ref))?;
        info!(path = ?path_ref, "config file not found, wrote defaults");
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;
    let cfg: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {:?}", path_ref))?;
    Ok(cfg)
}
