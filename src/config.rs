//! Configuration management for the DropFile server
//!
//! Values come from built-in defaults, then `config.toml`, then `DROPFILE_*`
//! environment variables, in increasing order of precedence.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Searched in order; the first file found is used.
const CONFIG_PATHS: [&str; 2] = [
    "dropfile/config", // container layout: /app/dropfile/config.toml
    "config",          // local development: ./config.toml
];

const MIN_REQUEST_LENGTH: usize = 64;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the session listener binds to
    /// Environment: DROPFILE_BIND_ADDRESS
    pub bind_address: String,

    /// Session listener port; 0 picks an ephemeral port
    /// Environment: DROPFILE_PORT
    pub port: u16,

    /// Directory holding `users/<user id>` roots
    /// Environment: DROPFILE_STORAGE_ROOT
    pub storage_root: String,

    /// Maximum concurrent sessions
    /// Environment: DROPFILE_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum upload size in MB
    /// Environment: DROPFILE_MAX_UPLOAD_SIZE_MB
    pub max_upload_size_mb: u64,

    /// Maximum length in bytes of one request line
    pub max_request_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 7070,
            storage_root: "./DropFile".to_string(),
            max_clients: 32,
            max_upload_size_mb: 100,
            max_request_length: 4096,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = CONFIG_PATHS
            .iter()
            .find(|path| PathBuf::from(format!("{path}.toml")).is_file())
            .copied()
            .unwrap_or(CONFIG_PATHS[1]);

        Self::load_from(config_path)
    }

    /// Load configuration from the given file (extension optional) with
    /// environment overrides. A missing file leaves the defaults in place.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage_root", defaults.storage_root)?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_upload_size_mb", defaults.max_upload_size_mb as i64)?
            .set_default("max_request_length", defaults.max_request_length as i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("DROPFILE").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.max_request_length < MIN_REQUEST_LENGTH {
            return Err(ConfigError::Message(format!(
                "max_request_length must be at least {MIN_REQUEST_LENGTH}"
            )));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn loads_values_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropfile.toml");
        fs::write(
            &path,
            "port = 9000\nstorage_root = \"/srv/dropfile\"\nmax_clients = 4\n",
        )
        .unwrap();

        let config = ServerConfig::load_from(path.to_str().unwrap()).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_root, "/srv/dropfile");
        assert_eq!(config.max_clients, 4);
        assert_eq!(config.max_upload_size_mb, 100);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = ServerConfig::default();
        config.max_clients = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.storage_root = " ".into();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.max_request_length = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn upload_limit_is_in_megabytes() {
        let config = ServerConfig {
            max_upload_size_mb: 2,
            ..ServerConfig::default()
        };
        assert_eq!(config.max_upload_size_bytes(), 2 * 1024 * 1024);

        let huge = ServerConfig {
            max_upload_size_mb: u64::MAX,
            ..ServerConfig::default()
        };
        assert_eq!(huge.max_upload_size_bytes(), u64::MAX);
    }
}
