//! Configuration for bringing up test clusters.
//!
//! Two layers live here:
//! - [`HarnessConfig`]: how the harness itself behaves (hosts, data dirs, rollback policy),
//!   loaded hierarchically from defaults, an optional file and environment variables
//! - [`NodeConfig`]: the startup parameters handed to one index server, produced by
//!   [`NodeConfigFactory`]
mod cluster;
mod node_config_factory;
use std::path::Path;
use std::path::PathBuf;

pub use cluster::*;
use config::ConfigError;
pub use node_config_factory::*;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::DATA_DIR_PREFIX;
use crate::constants::DEFAULT_BIND_HOST;
use crate::constants::ENV_PREFIX;
use crate::constants::WILDCARD_PROBE_HOST;
use crate::Error;
use crate::Result;

/// What to do with close failures while rolling back a partially started cluster.
///
/// Both policies attempt every close, in construction order, and neither changes
/// the error returned to the caller.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Log each close failure at `warn` and drop it
    #[default]
    BestEffort,
    /// Also attach close failures to [`crate::StartError::rollback_failures`]
    Collect,
}

/// Harness-level settings
///
/// Merged in the following order (later sources override earlier):
/// 1. Type defaults
/// 2. File named by `HARNESS_CONFIG_PATH` (if set)
/// 3. Environment variables with `HARNESS__` prefix
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HarnessConfig {
    /// Host used in every bind address and gossip seed
    ///
    /// Default: `localhost`
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Host the port probe listens on
    ///
    /// Default: `0.0.0.0`
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    /// Directory node data dirs are created in. System temp dir when absent.
    #[serde(default)]
    pub data_dir_root: Option<PathBuf>,

    /// Name prefix of each node's data dir
    ///
    /// Default: `index-node-`
    #[serde(default = "default_data_dir_prefix")]
    pub data_dir_prefix: String,

    #[serde(default)]
    pub rollback: RollbackPolicy,

    /// Remove data dirs of nodes that are discarded or shut down
    ///
    /// Default: `true`
    #[serde(default = "default_cleanup_data_dirs")]
    pub cleanup_data_dirs: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            probe_host: default_probe_host(),
            data_dir_root: None,
            data_dir_prefix: default_data_dir_prefix(),
            rollback: RollbackPolicy::default(),
            cleanup_data_dirs: default_cleanup_data_dirs(),
        }
    }
}

impl HarnessConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("HARNESS__BIND_HOST", "127.0.0.1");
    /// let cfg = HarnessConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies overrides from a config file, then the latest environment variables.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns the validated instance.
    ///
    /// # Errors
    /// - empty `bind_host` or `probe_host`
    /// - empty `data_dir_prefix`, or one containing a path separator
    /// - `data_dir_root` that cannot be created
    pub fn validate(self) -> Result<Self> {
        if self.bind_host.trim().is_empty() {
            return Err(invalid("bind_host cannot be empty"));
        }
        if self.probe_host.trim().is_empty() {
            return Err(invalid("probe_host cannot be empty"));
        }
        if self.data_dir_prefix.is_empty() {
            return Err(invalid("data_dir_prefix cannot be empty"));
        }
        if self.data_dir_prefix.contains(std::path::is_separator) {
            return Err(invalid(&format!(
                "data_dir_prefix {:?} must not contain a path separator",
                self.data_dir_prefix
            )));
        }
        if let Some(root) = &self.data_dir_root {
            validate_directory(root, "data_dir_root")?;
        }
        Ok(self)
    }

    /// Directory node data dirs are created in
    pub fn data_dir_root(&self) -> PathBuf {
        self.data_dir_root.clone().unwrap_or_else(env::temp_dir)
    }
}

fn invalid(msg: &str) -> Error {
    Error::Config(ConfigError::Message(msg.to_string()))
}

/// Ensures directory path is usable, creating it when missing
pub(super) fn validate_directory(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid(&format!("{name} path cannot be empty")));
    }

    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            invalid(&format!(
                "Failed to create {} directory at {}: {}",
                name,
                path.display(),
                e
            ))
        })?;
    }

    if !path.is_dir() {
        return Err(invalid(&format!("{} {} is not a directory", name, path.display())));
    }

    Ok(())
}

fn default_bind_host() -> String {
    DEFAULT_BIND_HOST.to_string()
}
fn default_probe_host() -> String {
    WILDCARD_PROBE_HOST.to_string()
}
fn default_data_dir_prefix() -> String {
    DATA_DIR_PREFIX.to_string()
}
fn default_cleanup_data_dirs() -> bool {
    true
}
