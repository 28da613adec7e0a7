/*!
 * Tests for application configuration functionality
 */

use nextstep::app_config::{Config, LogLevel, SeedUser};
use std::path::PathBuf;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert!(config.database.path.is_empty());
    assert!(config.seed.students_csv.is_none());
    assert_eq!(config.seed.users.len(), 1);
    assert_eq!(config.seed.users[0].email, "recruiter@example.com");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_deserialize_withMissingSections_shouldUseDefaults() {
    let config: Config = serde_json::from_str(r#"{ "log_level": "debug" }"#).unwrap();

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.seed.users, Config::default().seed.users);
    assert!(config.database.path.is_empty());
}

#[test]
fn test_config_validation_withBadSeedUser_shouldFail() {
    let mut config = Config::default();
    config.seed.users.push(SeedUser {
        email: "not-an-email".to_string(),
        first_name: "No".to_string(),
        last_name: "Mail".to_string(),
        company_name: String::new(),
        company_title: String::new(),
        password: "pw".to_string(),
    });
    assert!(config.validate().is_err());

    config.seed.users[1].email = "ok@example.com".to_string();
    assert!(config.validate().is_ok());

    config.seed.users[1].password.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_withEmptyCsvPath_shouldFail() {
    let mut config = Config::default();
    config.seed.students_csv = Some(PathBuf::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_databaseConfig_resolvedPath_shouldPreferConfiguredValue() {
    let mut config = Config::default();
    config.database.path = "  ./records.db ".to_string();
    assert_eq!(config.database.resolved_path().unwrap(), PathBuf::from("./records.db"));

    // Only checkable where the platform exposes a data directory
    config.database.path.clear();
    if let Ok(default_path) = config.database.resolved_path() {
        assert!(default_path.ends_with("nextstep/nextstep.db"));
    }
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(created, Config::default());

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded, created);
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(log::LevelFilter::from(&LogLevel::Warn), log::LevelFilter::Warn);
    assert_eq!(log::LevelFilter::from(&LogLevel::Trace), log::LevelFilter::Trace);
}
