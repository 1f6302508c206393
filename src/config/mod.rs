// ABOUTME: Inspector configuration loaded from an mcpServers JSON file
// ABOUTME: Produces the immutable server table and the inspector's history/timeout settings

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub mod settings;

pub use settings::InspectorSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config must contain an \"mcpServers\" object")]
    MissingServers,

    #[error("invalid server \"{name}\": {reason}")]
    InvalidServer { name: String, reason: String },
}

/// One configured server, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Unique server name (the key under `mcpServers`)
    pub name: String,

    /// Executable to spawn
    pub command: String,

    /// Command-line arguments
    pub args: Vec<String>,

    /// Extra environment for the child process
    pub env: BTreeMap<String, String>,
}

impl ServerConfig {
    /// Command line as a single display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Deserialize)]
struct RawServer {
    #[serde(default)]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

/// Parsed config file.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Servers sorted by name
    pub servers: Vec<ServerConfig>,

    /// History and timeout settings from the optional `inspector` section
    pub settings: InspectorSettings,
}

impl InspectorConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_value(&value).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            servers = config.servers.len(),
            "Loaded inspector config"
        );
        Ok(config)
    }

    /// Build from an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let servers = value
            .get("mcpServers")
            .and_then(Value::as_object)
            .ok_or(ConfigError::MissingServers)?;

        let mut parsed = BTreeMap::new();
        for (name, raw) in servers {
            let raw: RawServer =
                serde_json::from_value(raw.clone()).map_err(|e| ConfigError::InvalidServer {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            if raw.command.trim().is_empty() {
                return Err(ConfigError::InvalidServer {
                    name: name.clone(),
                    reason: "missing command".to_string(),
                });
            }
            parsed.insert(
                name.clone(),
                ServerConfig {
                    name: name.clone(),
                    command: raw.command,
                    args: raw.args,
                    env: raw.env,
                },
            );
        }

        let settings = match value.get("inspector") {
            Some(section) => serde_json::from_value(section.clone()).map_err(|source| {
                ConfigError::Parse {
                    path: PathBuf::new(),
                    source,
                }
            })?,
            None => InspectorSettings::default(),
        }
        .normalized();

        Ok(Self {
            servers: parsed.into_values().collect(),
            settings,
        })
    }
}
