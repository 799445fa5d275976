use std::path::PathBuf;
use std::time::Duration;
use xyzreader_core::config::DEFAULT_LOAD_TIMEOUT_MS;
use xyzreader_core::{ConfigError, ReaderConfig};

#[test]
fn load_reads_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reader.toml");
    std::fs::write(
        &path,
        "log_level = \"debug\"\ndb_path = \"/data/articles.db\"\nready_timeout_ms = 1500\n",
    )
    .unwrap();

    let config = ReaderConfig::load(Some(&path)).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.db_path, Some(PathBuf::from("/data/articles.db")));
    assert_eq!(config.ready_timeout(), Duration::from_millis(1500));
    assert_eq!(config.load_timeout_ms, DEFAULT_LOAD_TIMEOUT_MS);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ReaderConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.load_timeout_ms, ReaderConfig::default().load_timeout_ms);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reader.toml");
    std::fs::write(&path, "load_timeout_ms = \"fast\"").unwrap();

    assert!(matches!(
        ReaderConfig::load(Some(&path)),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn unsupported_log_level_is_rejected() {
    let err = ReaderConfig::from_toml_str("log_level = \"verbose\"").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "log_level",
            ..
        }
    ));
}
