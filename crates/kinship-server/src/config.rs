//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, database path,
//! JWT secret, token expiry, and users to seed into the directory.

use kinship_domain::{User, UserId};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A field is present but unusable
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// SQLite database file, or ":memory:"
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// Token expiry in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// Tracing filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// SQLite busy timeout in milliseconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Users inserted into the directory at startup when absent
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

/// A user profile to seed
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    /// Fixed identity (hyphenated UUID); generated when omitted
    #[serde(default)]
    pub id: Option<String>,

    /// Contact address
    pub contact: String,

    /// Display name
    pub display_name: String,

    /// Avatar reference
    #[serde(default)]
    pub avatar: Option<String>,

    /// Bio
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserSeed {
    /// Build the directory profile for this seed
    pub fn to_user(&self) -> Result<User, ConfigError> {
        let id = match &self.id {
            Some(raw) => UserId::from_string(raw).map_err(|reason| ConfigError::InvalidValue {
                field: format!("users.id ({})", self.contact),
                reason,
            })?,
            None => UserId::new(),
        };

        let mut user = User::new(id, self.contact.clone(), self.display_name.clone());
        user.avatar = self.avatar.clone();
        user.bio = self.bio.clone();
        Ok(user)
    }
}

fn default_database_path() -> String {
    "kinship.db".to_string()
}

/// Default token expiry: 1 hour
fn default_token_expiry() -> u64 {
    3600
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_busy_timeout() -> u64 {
    5000
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }
        for seed in &config.users {
            seed.to_user()?;
        }

        Ok(config)
    }

    /// Create a default configuration for development and tests
    ///
    /// Uses an in-memory database seeded with two users.
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: 3600,
            log_filter: default_log_filter(),
            busy_timeout_ms: default_busy_timeout(),
            users: vec![
                UserSeed {
                    id: Some("01890000-0000-7000-8000-000000000001".to_string()),
                    contact: "alice@example.com".to_string(),
                    display_name: "Alice".to_string(),
                    avatar: None,
                    bio: None,
                },
                UserSeed {
                    id: Some("01890000-0000-7000-8000-000000000002".to_string()),
                    contact: "bob@example.com".to_string(),
                    display_name: "Bob".to_string(),
                    avatar: None,
                    bio: None,
                },
            ],
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// SQLite busy timeout as a duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
