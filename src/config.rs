//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fpstats.toml` files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".fpstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Reporting API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// CxSAST connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Skip TLS certificate validation (self-signed CxSAST installs).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// OAuth client used for the resource-owner password grant.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_client_secret")]
    pub client_secret: String,

    /// Token scope granting OData access.
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            accept_invalid_certs: false,
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            scope: default_scope(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_client_id() -> String {
    "resource_owner_sast_client".to_string()
}

fn default_client_secret() -> String {
    "014DF517-39D1-4453-B7B3-9930C563627C".to_string()
}

fn default_scope() -> String {
    "sast_api".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if args.insecure {
            self.api.accept_invalid_certs = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.timeout_seconds, 120);
        assert_eq!(config.api.client_id, "resource_owner_sast_client");
        assert_eq!(config.api.scope, "sast_api");
        assert!(!config.api.accept_invalid_certs);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
timeout_seconds = 30
accept_invalid_certs = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.accept_invalid_certs);
        assert_eq!(config.api.client_id, "resource_owner_sast_client");
    }

    #[test]
    fn test_merge_with_args() {
        let args = crate::cli::Args::parse_from([
            "fpstats",
            "--cxsast_base_url",
            "https://cxsast.local",
            "--cxsast_username",
            "admin",
            "--cxsast_password",
            "secret",
            "--timeout",
            "15",
        ]);

        let mut config = Config::default();
        config.api.accept_invalid_certs = true;
        config.merge_with_args(&args);

        assert_eq!(config.api.timeout_seconds, 15);
        // Flags that were not passed keep the file value.
        assert!(config.api.accept_invalid_certs);
    }
}
