// Configuration loading tests
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use flightcache::cli::Args;
use flightcache::config::AppConfig;
use flightcache::error::AnalyticsError;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_overrides_defaults() {
    let file = write_config(
        r#"
[store]
host = "cache.internal"
port = 6380

[cache]
ttl_seconds = 300

[dataset]
path = "/data/flights_2019.csv"
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.store.host, "cache.internal");
    assert_eq!(config.store.port, 6380);
    assert_eq!(config.cache.ttl_seconds, 300);
    assert_eq!(config.dataset.path, "/data/flights_2019.csv");

    // Untouched sections keep their defaults
    assert_eq!(config.cache.key_prefix, "flightcache");
    assert_eq!(config.dataset.date_column, "FL_DATE");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_zero_ttl_in_file_is_rejected() {
    let file = write_config("[cache]\nttl_seconds = 0\n");
    let config = AppConfig::load(Some(file.path())).unwrap();
    assert!(matches!(config.validate(), Err(AnalyticsError::Config(_))));
}

#[test]
fn test_cli_flag_repairs_file_setting() {
    let file = write_config("[cache]\nttl_seconds = 0\n");
    let mut config = AppConfig::load(Some(file.path())).unwrap();

    let args = Args::parse_from(["flightcache", "--ttl", "60"]);
    args.apply_to(&mut config);
    assert!(config.validate().is_ok());
    assert_eq!(config.cache.ttl_seconds, 60);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let result = AppConfig::load(Some(std::path::Path::new("/nonexistent/flightcache.toml")));
    assert!(result.is_err());
}
