//! Application settings.
//!
//! Read from `settings.toml` (or the file named by `MASKMART_SETTINGS`), then
//! overridden by `MASKMART__SECTION__KEY` environment variables.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    /// IANA zone name.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
            timezone: default_timezone(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    pub database: Database,
}

fn default_port() -> u16 {
    3000
}

/// Seed files imported at startup when the store is empty.
#[derive(Debug, Deserialize)]
pub struct Import {
    pub pharmacies: PathBuf,
    pub users: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub import: Option<Import>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let path = std::env::var("MASKMART_SETTINGS").unwrap_or_else(|_| "settings".to_string());

        Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("MASKMART").separator("__"))
            .build()?
            .try_deserialize()
    }
}
