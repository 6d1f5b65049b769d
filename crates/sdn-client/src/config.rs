//! Client configuration management
//!
//! Connection settings for the Proxmox cluster API, loaded from a TOML file
//! with `PVE_SDN_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://localhost:8006/api2/json";

const ENV_PREFIX: &str = "PVE_SDN";

/// Client configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid API token, expected 'user@realm!tokenid=secret'")]
    InvalidToken,

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Connection settings for the cluster API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://pve1:8006/api2/json`
    pub endpoint: String,
    /// API token as `user@realm!tokenid=secret`
    pub api_token: Option<String>,
    /// Accept self-signed certificates
    pub insecure: bool,
    /// Per-request timeout in seconds; unset means no client-side timeout
    pub timeout: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            insecure: false,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with defaults and environment overrides
    pub fn load_with_defaults() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("insecure", false)?;

        if let Some(path) = Self::default_paths().into_iter().find(|path| path.exists()) {
            log::debug!("Loading client configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Standard configuration locations; the first existing one is used
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./pvesdn.toml")];

        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".config/pvesdn/config.toml"));
        }

        paths.push(PathBuf::from("/etc/pve/sdn-client.toml"));
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }

        if let Some(token) = &self.api_token {
            let (token_id, secret) = token.split_once('=').ok_or(ConfigError::InvalidToken)?;
            let (user, token_name) = token_id.split_once('!').ok_or(ConfigError::InvalidToken)?;

            if secret.is_empty() || token_name.is_empty() || !user.contains('@') {
                return Err(ConfigError::InvalidToken);
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Render as TOML, e.g. to seed a configuration file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("pvesdn.toml");
        fs::write(&path, content).expect("Failed to write test file");
        (temp_dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.insecure);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let (_dir, path) = write_config(
            r#"
endpoint = "https://pve1.example.com:8006/api2/json"
api_token = "terraform@pve!provider=5b8c4f7e-0000-4000-8000-000000000000"
insecure = true
timeout = 30
"#,
        );

        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.endpoint, "https://pve1.example.com:8006/api2/json");
        assert!(config.insecure);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(config.api_token.is_some());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (_dir, path) = write_config("insecure = true\n");

        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_invalid_token_rejected() {
        for token in ["secret", "root@pam=secret", "root!id=secret", "root@pam!id="] {
            let config = ClientConfig {
                api_token: Some(token.to_string()),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidToken)),
                "token {token} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let (_dir, path) = write_config("endpoint = \"pve1:8006\"\n");
        assert!(matches!(
            ClientConfig::load_from_file(&path),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_toml_rendering_round_trip() {
        let config = ClientConfig {
            api_token: Some("root@pam!cli=abc".to_string()),
            timeout: Some(10),
            ..Default::default()
        };

        let rendered = config.to_toml().unwrap();
        let (_dir, path) = write_config(&rendered);
        assert_eq!(ClientConfig::load_from_file(&path).unwrap(), config);
    }
}
