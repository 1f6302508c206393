// ABOUTME: CLI argument parsing for mcp-inspect
//
// Usage: mcp-inspect <CONFIG> [--history-capacity N] [--request-timeout SECS]

use clap::Parser;
use std::path::PathBuf;

use crate::config::InspectorSettings;

/// Interactive inspector for MCP servers
#[derive(Parser, Debug)]
#[command(name = "mcp-inspect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON config file with an "mcpServers" object
    pub config: PathBuf,

    /// Maximum history entries kept per server (overrides the config file)
    #[arg(long, value_name = "N")]
    pub history_capacity: Option<usize>,

    /// Seconds before a pending request is marked timed out (overrides the config file)
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<u64>,
}

impl Cli {
    /// Apply command-line overrides on top of the file settings.
    pub fn settings(&self, base: InspectorSettings) -> InspectorSettings {
        base.with_overrides(self.history_capacity, self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_config_path_is_required() {
        assert!(Cli::try_parse_from(["mcp-inspect"]).is_err());
    }

    #[test]
    fn test_overrides_replace_file_settings() {
        let cli = Cli::try_parse_from([
            "mcp-inspect",
            "servers.json",
            "--history-capacity",
            "50",
            "--request-timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("servers.json"));

        let settings = cli.settings(InspectorSettings::default());
        assert_eq!(settings.history_capacity, 50);
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_overrides_keep_file_settings() {
        let cli = Cli::try_parse_from(["mcp-inspect", "servers.json"]).unwrap();
        let base = InspectorSettings {
            history_capacity: 7,
            request_timeout: Duration::from_secs(9),
        };
        let settings = cli.settings(base);
        assert_eq!(settings.history_capacity, 7);
        assert_eq!(settings.request_timeout, Duration::from_secs(9));
    }
}
