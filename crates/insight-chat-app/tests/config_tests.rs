//! Integration tests for environment configuration.

use std::collections::HashMap;

use insight_chat_app::{
    API_BASE_URL_ENV, AppConfig, DEFAULT_API_BASE_URL, DEFAULT_LOG_FILTER, LOG_FILTER_ENV,
};

fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, insight_chat_auth::AuthError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn config_tests_defaults_apply_when_unset_or_blank() {
    let config = config_from(&[(API_BASE_URL_ENV, "  ")]).expect("defaults should be valid");
    assert_eq!(config.api_base_url.as_str(), DEFAULT_API_BASE_URL);
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
}

#[test]
fn config_tests_overrides_are_validated() {
    let config = config_from(&[
        (API_BASE_URL_ENV, "https://analysis.example.test/api"),
        (LOG_FILTER_ENV, "debug"),
    ])
    .expect("https override should be valid");
    assert_eq!(config.api_base_url.host_str(), Some("analysis.example.test"));
    assert_eq!(config.log_filter, "debug");

    assert!(config_from(&[(API_BASE_URL_ENV, "http://analysis.example.test/api")]).is_err());
    assert!(config_from(&[(API_BASE_URL_ENV, "not a url")]).is_err());
}
