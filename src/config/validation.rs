use crate::config::types::{ClientConfig, Config, FirewallConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_firewall_config(&config.firewall)?;
    validate_client_config(&config.client)?;
    Ok(())
}

/// Validates firewall connection settings
fn validate_firewall_config(config: &FirewallConfig) -> Result<(), ConfigError> {
    validate_host(&config.host)?;

    if config.port == 0 {
        return Err(ConfigError::Validation("port must be non-zero".to_string()));
    }

    if config.scheme != "https" && config.scheme != "http" {
        return Err(ConfigError::Validation(format!(
            "scheme must be 'http' or 'https', got '{}'",
            config.scheme
        )));
    }

    if config.username.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.ca_cert_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "ca-cert-path cannot be empty when set".to_string(),
            ));
        }
    }

    // The assembled base URL must parse
    base_url(config)?;

    Ok(())
}

/// Validates HTTP client settings
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 32, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.session_idle_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "session-idle-timeout-secs must be >= 1 when set".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a hostname, IPv4 or IPv6 literal
fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
    {
        return Err(ConfigError::Validation(format!(
            "host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') {
        return Err(ConfigError::Validation(format!(
            "host '{}' cannot start or end with '.' or start with '-'",
            host
        )));
    }

    Ok(())
}

/// Builds the web interface root URL from the firewall settings
pub fn base_url(config: &FirewallConfig) -> Result<Url, ConfigError> {
    let host = if config.host.contains(':') && !config.host.starts_with('[') {
        format!("[{}]", config.host)
    } else {
        config.host.clone()
    };

    let raw = format!("{}://{}:{}/", config.scheme, host, config.port);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))
}
