use serde::Deserialize;
use std::fmt;

/// Main configuration structure for pfsense-watch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub firewall: FirewallConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Where the firewall lives and how to log into it
#[derive(Clone, Deserialize)]
pub struct FirewallConfig {
    /// Hostname or IP address of the web interface
    pub host: String,

    /// Port of the web interface
    #[serde(default = "default_port")]
    pub port: u16,

    /// `https` (default) or `http`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Web UI account name
    pub username: String,

    /// Web UI account password
    pub password: String,

    /// Verify the appliance's TLS certificate
    #[serde(rename = "verify-tls", default = "default_verify_tls")]
    pub verify_tls: bool,

    /// PEM bundle with the CA that signed the appliance certificate
    #[serde(rename = "ca-cert-path", default)]
    pub ca_cert_path: Option<String>,
}

// Keeps the password out of logs and panic messages
impl fmt::Debug for FirewallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirewallConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("ca_cert_path", &self.ca_cert_path)
            .finish()
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Attempts per request for transient failures
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between attempts (milliseconds), multiplied by the attempt number
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum number of requests in flight against the web interface
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u32,

    /// Treat the session as expired after this much inactivity (seconds)
    #[serde(rename = "session-idle-timeout-secs", default)]
    pub session_idle_timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_concurrent_requests: default_max_concurrent_requests(),
            session_idle_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_port() -> u16 {
    443
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_concurrent_requests() -> u32 {
    4
}

fn default_user_agent() -> String {
    format!("pfsense-watch/{}", env!("CARGO_PKG_VERSION"))
}
