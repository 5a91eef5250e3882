use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Where store snapshots are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<store>.json` per persisted store.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

/// Remote counter API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the counter API (scheme + host + optional path prefix).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Counter id used when none is given on the command line.
    #[serde(default = "default_counter_id")]
    pub counter_id: String,
    /// Total request timeout. Unset means requests may wait forever.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("counterstate")
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_counter_id() -> String {
    "1".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            counter_id: default_counter_id(),
            timeout_seconds: None,
        }
    }
}
