//! Gate configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use checkpoint_types::GateParams;

use crate::error::DaemonError;

/// Configuration for a checkpoint gate.
///
/// Can be loaded from a TOML file via [`GateConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Policy parameters sit at the
/// top level of the file alongside the server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the JSON ticket file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Admission policy parameters.
    #[serde(flatten)]
    pub params: GateParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    3000
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./checkpoint_data.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GateConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, DaemonError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DaemonError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("GateConfig is always serializable to TOML")
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_file: default_data_file(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            params: GateParams::default(),
        }
    }
}
