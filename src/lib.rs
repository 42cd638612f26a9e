//! pfsense-watch: a read-only monitoring client for pfSense
//!
//! The appliance has no native API, so this crate logs into the administrative
//! web interface, scrapes status pages (HTML tables, JSON fragments, plain
//! text) and normalizes them into typed records per endpoint.

pub mod api;
pub mod coerce;
pub mod config;
pub mod parsers;
pub mod session;
pub mod table;

use thiserror::Error;

/// Main error type for pfsense-watch operations
#[derive(Debug, Error)]
pub enum PfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Request failed: {0}")]
    Request(#[from] RequestError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to parse {endpoint_id}: {cause}")]
    Parse {
        endpoint_id: String,
        cause: parsers::ParseFailure,
    },

    /// The task fetching an endpoint panicked or was cancelled
    #[error("Task for {endpoint_id} did not complete: {reason}")]
    Task { endpoint_id: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Authentication handshake failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("firewall unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected response during login: {0}")]
    UnexpectedResponse(String),
}

/// Failures while issuing a request through the session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("session expired and re-login failed: {0}")]
    SessionExpired(#[source] AuthError),

    #[error("login required before request failed: {0}")]
    Auth(#[source] AuthError),
}

impl RequestError {
    /// Transport failures worth another attempt
    ///
    /// Timeouts, connection problems and 5xx answers are transient. Anything
    /// involving authentication is surfaced straight away.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::SessionExpired(_) | Self::Auth(_) => false,
        }
    }
}

/// Result type alias for pfsense-watch operations
pub type Result<T> = std::result::Result<T, PfError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{PfSenseClient, SystemStats};
pub use config::Config;
pub use parsers::Record;
pub use session::{SessionManager, SessionState};
