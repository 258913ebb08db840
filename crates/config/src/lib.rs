//! Layered configuration for treesync.
//!
//! Later sources override earlier ones:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory,
//! 3. `treesync.toml`, `treesync.yaml` or `treesync.json` in the working
//!    directory,
//! 4. `TREESYNC_` environment variables, with `__` separating nested keys
//!    (`TREESYNC_TRANSFER__BATCH_SIZE=4`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "TREESYNC_";

/// Working-directory configuration files, in the order they are merged.
pub const LOCAL_FILES: [&str; 3] = ["treesync.toml", "treesync.yaml", "treesync.json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// State database, relative to the working directory.
    pub state_file: PathBuf,
    pub remote: RemoteConfig,
    pub transfer: TransferConfig,
    pub progress: ProgressConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".treesync.db"),
            remote: RemoteConfig::default(),
            transfer: TransferConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Directory holding a project export to pull from.
    pub mirror: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Maximum number of concurrent remote requests.
    pub batch_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { batch_size: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Files a download must include before any progress is shown.
    pub expected_batch_size: usize,
    /// Percentage points between two progress updates.
    pub increment: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { expected_batch_size: 10, increment: 10.0 }
    }
}

/// Location of the per-user configuration file, if the platform has one.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treesync").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load and validate the configuration for a working directory.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_figment(Self::figment(global_config_path().as_deref(), dir))
    }

    /// Every configuration source, merged in order of precedence.
    pub fn figment(global: Option<&Path>, dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(global) = global {
            figment = figment.merge(Toml::file(global));
        }
        let [toml, yaml, json] = LOCAL_FILES.map(|name| dir.join(name));
        figment
            .merge(Toml::file(toml))
            .merge(Yaml::file(yaml))
            .merge(Json::file(json))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transfer.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("transfer.batch_size must be at least 1".to_string()));
        }
        if !(self.progress.increment > 0.0 && self.progress.increment <= 100.0) {
            exn::bail!(ErrorKind::Invalid(format!(
                "progress.increment must be within (0, 100], got {}",
                self.progress.increment
            )));
        }
        Ok(())
    }
}
