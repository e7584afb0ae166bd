//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).expect("first initialization succeeds");
    tracing::debug!(target: "core_fetch", attempt = 1, "logging online");

    match init_logging(config) {
        Err(Error::Config(msg)) => assert!(msg.contains("Failed to initialize logging")),
        other => panic!("second initialization must fail, got {:?}", other),
    }
}

#[test]
fn test_secret_fields_are_redacted() {
    assert_eq!(redact_if_sensitive("api_key", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("decryption_key", "0011"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("access_token", "tok"), "[REDACTED]");
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("track_id", "5ByAIlEEnxYdvpnezg7HTX"), "5ByAIlEEnxYdvpnezg7HTX");
    assert_eq!(redact_if_sensitive("chat_id", "-100123"), "-100123");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/srv/downloads/abc.encrypted.ogg"), "abc.encrypted.ogg");
    assert_eq!(strip_path("D:\\data\\abc.mp3"), "abc.mp3");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}
