// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use flightcache::error::AnalyticsError;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        AnalyticsError::Connection("Connection refused".to_string()),
        AnalyticsError::Config("bad ttl".to_string()),
        AnalyticsError::MissingColumn("ARR_DELAY".to_string()),
        AnalyticsError::Dataset("unrecognized date".to_string()),
        AnalyticsError::Internal("task panicked".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_connection_error_is_cache_failure() {
    let error = AnalyticsError::Connection("Connection refused".to_string());
    assert!(error.is_cache_failure());
    assert!(error.is_connection());
    assert!(format!("{}", error).contains("Connection refused"));
}

#[test]
fn test_serialization_error_is_cache_failure() {
    let json_err = serde_json::from_str::<u64>("\"x\"").unwrap_err();
    let error = AnalyticsError::from(json_err);
    assert!(error.is_cache_failure());
    assert!(!error.is_connection());
}

#[test]
fn test_dataset_errors_are_fatal() {
    assert!(!AnalyticsError::MissingColumn("ARR_DELAY".to_string()).is_cache_failure());
    assert!(!AnalyticsError::Config("ttl".to_string()).is_cache_failure());
    assert!(!AnalyticsError::Dataset("bad date".to_string()).is_cache_failure());
}

#[test]
fn test_missing_column_error() {
    let error = AnalyticsError::MissingColumn("WEATHER_DELAY".to_string());
    assert!(format!("{}", error).contains("WEATHER_DELAY"));
}

#[test]
fn test_rejected_client_config_is_not_a_connection_error() {
    let redis_err = redis::RedisError::from((redis::ErrorKind::InvalidClientConfig, "invalid database number"));
    let error = AnalyticsError::from(redis_err);
    assert!(matches!(error, AnalyticsError::Config(_)));
    assert!(!error.is_cache_failure());
}

#[test]
fn test_redis_error_maps_to_connection() {
    let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection reset"));
    let error = AnalyticsError::from(redis_err);
    assert!(error.is_connection());
}
