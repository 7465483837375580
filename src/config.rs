use std::{path::PathBuf, str::FromStr};

use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "office-connect";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub uploads: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("store"),
            uploads: PathBuf::from("uploads"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long an idle session stays valid.
    pub session_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { session_days: 7 }
    }
}

/// Account created on startup when no user with this name exists yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub user_name: String,
    pub password: String,
}

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            user_name: "admin".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AdminConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl LogLevel {
    pub fn filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.0).unwrap_or(LevelFilter::Info)
    }
}

impl AppConfig {
    /// Reads `office-connect.toml` (optional) and `OFFICE_*` environment
    /// variables, e.g. `OFFICE_SERVER__PORT=9000`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("OFFICE").prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn address(&self) -> (&str, u16) {
        (self.server.host.as_str(), self.server.port)
    }
}
