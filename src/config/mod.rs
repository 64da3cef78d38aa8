use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort startup. Everything else in the app degrades into a
/// status message, but a broken config or credential file means we cannot
/// even build a store client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read credential file {path}: {source}")]
    CredentialsUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("credential file {path} is not valid JSON: {source}")]
    CredentialsInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("credential file {path} has an empty database_secret")]
    EmptySecret { path: PathBuf },

    #[error("database url {url:?} is not a valid http(s) url")]
    InvalidDatabaseUrl { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the realtime database, e.g.
    /// "https://home-be9db-default-rtdb.asia-southeast1.firebasedatabase.app/"
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Collection (top-level path) holding the friend records
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Path to the JSON credential file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_file: Option<PathBuf>,

    /// Seconds between automatic refreshes of the map in the TUI
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_database_url() -> String {
    "https://home-be9db-default-rtdb.asia-southeast1.firebasedatabase.app/".to_string()
}

fn default_collection() -> String {
    "friend_houses".to_string()
}

fn default_refresh_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            collection: default_collection(),
            credential_file: None,
            refresh_secs: default_refresh_secs(),
        }
    }
}

/// Contents of the credential file. Only the database secret is used; extra
/// fields from exported service-account files are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub database_secret: String,
}

impl AppConfig {
    /// Get the config directory (~/.config/friendmap)
    fn config_dir() -> Option<PathBuf> {
        let dir = dirs::config_dir()?.join("friendmap");

        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Some(dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Self {
        let path = match Self::config_dir() {
            Some(dir) => dir.join("config.toml"),
            None => return AppConfig::default(),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        config
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Where to look for the credential file when the config doesn't name one
    pub fn credential_path(&self) -> PathBuf {
        if let Some(ref path) = self.credential_file {
            return path.clone();
        }
        Self::config_dir()
            .map(|d| d.join("credentials.json"))
            .unwrap_or_else(|| PathBuf::from("credentials.json"))
    }
}

impl Credentials {
    /// Load and validate the credential file. Any failure here is a
    /// ConfigError and halts startup.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let creds: Credentials =
            serde_json::from_str(&content).map_err(|source| ConfigError::CredentialsInvalid {
                path: path.to_path_buf(),
                source,
            })?;

        if creds.database_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret {
                path: path.to_path_buf(),
            });
        }

        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            database_url: "https://example-rtdb.firebasedatabase.app/".to_string(),
            collection: "friend_houses".to_string(),
            credential_file: Some(PathBuf::from("/tmp/creds.json")),
            refresh_secs: 5,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.database_url, deserialized.database_url);
        assert_eq!(config.collection, deserialized.collection);
        assert_eq!(config.refresh_secs, deserialized.refresh_secs);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.collection, "friend_houses");
        assert_eq!(config.refresh_secs, 10);
        assert!(config.credential_file.is_none());
    }

    #[test]
    fn test_credentials_parse() {
        let dir = std::env::temp_dir().join("friendmap-test-creds-ok");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.json");
        std::fs::write(&path, r#"{"database_secret": "s3cret", "project": "home"}"#).unwrap();

        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.database_secret, "s3cret");
    }

    #[test]
    fn test_credentials_missing_file_is_config_error() {
        let err = Credentials::load(Path::new("/nonexistent/credentials.json")).unwrap_err();
        assert!(matches!(err, ConfigError::CredentialsUnreadable { .. }));
    }

    #[test]
    fn test_credentials_empty_secret_rejected() {
        let dir = std::env::temp_dir().join("friendmap-test-creds-empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.json");
        std::fs::write(&path, r#"{"database_secret": "   "}"#).unwrap();

        let err = Credentials::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySecret { .. }));
    }
}
