use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides, e.g. `LEGACY_DATA_DIR`
pub const ENV_PREFIX: &str = "LEGACY";

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory holding the ledger snapshot
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`
    pub snapshot_file: String,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_file: "legacy_state.json".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load from a YAML/TOML/JSON file, then apply `LEGACY_*` environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Defaults plus `LEGACY_*` environment overrides
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Full path of the ledger snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
