use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "LAUNCHPAD_ENV"));
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.template_path.is_none());
    assert!(!cfg.backend.is_enabled());
    assert_eq!(cfg.backend.base_url, "https://api.openai.com/v1");
    assert_eq!(cfg.backend.model, "gpt-4.1-mini");
    assert_eq!(cfg.backend.timeout_secs, 30);
    assert_eq!(cfg.backend.max_retries, 2);
    assert_eq!(cfg.backend.retry_backoff_base_ms, 500);
    assert_eq!(cfg.debounce_ms, 400);
    assert_eq!(cfg.max_sessions, 256);
    assert_eq!(cfg.session_idle_secs, 1800);
}

#[test]
fn api_key_enables_backend() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-test");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.backend.is_enabled());
    assert_eq!(cfg.backend.api_key.as_deref(), Some("sk-test"));
}

#[test]
fn empty_api_key_is_fallback_only() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.backend.is_enabled());
}

#[test]
fn debug_output_redacts_api_key() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-very-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sk-very-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_BIND_ADDR"),
        "expected InvalidEnvVar(LAUNCHPAD_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn template_path_override() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_TEMPLATE_PATH", "./config/template.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.template_path.as_deref(),
        Some(std::path::Path::new("./config/template.yaml"))
    );
}

#[test]
fn debounce_override() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_DEBOUNCE_MS", "750");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.debounce_ms, 750);
}

#[test]
fn debounce_invalid() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_DEBOUNCE_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_DEBOUNCE_MS"),
        "expected InvalidEnvVar(LAUNCHPAD_DEBOUNCE_MS), got: {result:?}"
    );
}

#[test]
fn backend_timeout_must_be_positive() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_BACKEND_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_BACKEND_TIMEOUT_SECS"),
        "expected InvalidEnvVar(LAUNCHPAD_BACKEND_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn backend_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_BACKEND_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_BACKEND_MAX_RETRIES"),
        "expected InvalidEnvVar(LAUNCHPAD_BACKEND_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn backend_url_must_be_http() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_BACKEND_URL", "ftp://example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_BACKEND_URL"),
        "expected InvalidEnvVar(LAUNCHPAD_BACKEND_URL), got: {result:?}"
    );
}

#[test]
fn session_limits_override() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_MAX_SESSIONS", "8");
    map.insert("LAUNCHPAD_SESSION_IDLE_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_sessions, 8);
    assert_eq!(cfg.session_idle_secs, 60);
}

#[test]
fn max_sessions_must_be_positive() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_MAX_SESSIONS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_MAX_SESSIONS"),
        "expected InvalidEnvVar(LAUNCHPAD_MAX_SESSIONS), got: {result:?}"
    );
}

#[test]
fn session_idle_secs_must_be_positive() {
    let mut map = HashMap::new();
    map.insert("LAUNCHPAD_SESSION_IDLE_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LAUNCHPAD_SESSION_IDLE_SECS"),
        "expected InvalidEnvVar(LAUNCHPAD_SESSION_IDLE_SECS), got: {result:?}"
    );
}
