use crate::app_config::{AppConfig, BackendSettings, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values count as unset.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("LAUNCHPAD_ENV", "development"))?;

    let bind_addr = or_default("LAUNCHPAD_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("LAUNCHPAD_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("LAUNCHPAD_LOG_LEVEL", "info");
    let template_path = optional("LAUNCHPAD_TEMPLATE_PATH").map(PathBuf::from);

    let base_url = or_default("LAUNCHPAD_BACKEND_URL", "https://api.openai.com/v1");
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(invalid(
            "LAUNCHPAD_BACKEND_URL",
            format!("'{base_url}' is not an http(s) URL"),
        ));
    }

    let timeout_secs = parse_u64("LAUNCHPAD_BACKEND_TIMEOUT_SECS", "30")?;
    if timeout_secs == 0 {
        return Err(invalid(
            "LAUNCHPAD_BACKEND_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let backend = BackendSettings {
        api_key: optional("OPENAI_API_KEY"),
        base_url,
        model: or_default("LAUNCHPAD_BACKEND_MODEL", "gpt-4.1-mini"),
        timeout_secs,
        max_retries: parse_u32("LAUNCHPAD_BACKEND_MAX_RETRIES", "2")?,
        retry_backoff_base_ms: parse_u64("LAUNCHPAD_BACKEND_RETRY_BACKOFF_BASE_MS", "500")?,
    };

    let debounce_ms = parse_u64("LAUNCHPAD_DEBOUNCE_MS", "400")?;

    let max_sessions = or_default("LAUNCHPAD_MAX_SESSIONS", "256")
        .parse::<usize>()
        .map_err(|e| invalid("LAUNCHPAD_MAX_SESSIONS", e.to_string()))?;
    if max_sessions == 0 {
        return Err(invalid(
            "LAUNCHPAD_MAX_SESSIONS",
            "must be greater than zero".to_string(),
        ));
    }

    let session_idle_secs = parse_u64("LAUNCHPAD_SESSION_IDLE_SECS", "1800")?;
    if session_idle_secs == 0 {
        return Err(invalid(
            "LAUNCHPAD_SESSION_IDLE_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        template_path,
        backend,
        debounce_ms,
        max_sessions,
        session_idle_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LAUNCHPAD_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
