use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::database::connection::DatabaseConnection;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Initial data settings
    #[serde(default)]
    pub seed: SeedConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DatabaseConfig {
    /// Database file; `:memory:` for a throwaway store. Empty means the
    /// per-user default location.
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    /// Resolve the configured path, falling back to the default location
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if self.path.trim().is_empty() {
            DatabaseConnection::default_database_path()
        } else {
            Ok(PathBuf::from(self.path.trim()))
        }
    }
}

/// Seed data configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeedConfig {
    /// CSV file with student rows; the bundled dataset is used when unset
    #[serde(default)]
    pub students_csv: Option<PathBuf>,

    /// Recruiter accounts created on an empty store
    #[serde(default = "default_seed_users")]
    pub users: Vec<SeedUser>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            students_csv: None,
            users: default_seed_users(),
        }
    }
}

/// A recruiter account to create during seeding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeedUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_title: String,
    pub password: String,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_seed_users() -> Vec<SeedUser> {
    vec![SeedUser {
        email: "recruiter@example.com".to_string(),
        first_name: "Demo".to_string(),
        last_name: "Recruiter".to_string(),
        company_name: "NextStep".to_string(),
        company_title: "Talent Partner".to_string(),
        password: "ChangeMe!1".to_string(),
    }]
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if let Some(csv) = &self.seed.students_csv {
            if csv.as_os_str().is_empty() {
                return Err(anyhow!("seed.students_csv must not be empty when set"));
            }
        }

        for (index, user) in self.seed.users.iter().enumerate() {
            crate::validation::validate_email(&user.email)
                .with_context(|| format!("seed.users[{}] has an invalid email", index))?;
            if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
                return Err(anyhow!("seed.users[{}] needs a first and last name", index));
            }
            if user.password.is_empty() {
                return Err(anyhow!("seed.users[{}] needs a password", index));
            }
        }

        Ok(())
    }

    /// Read the configuration at `path`, writing the defaults there first
    /// if the file does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            seed: SeedConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
