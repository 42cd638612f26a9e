//! HTTP transport for the web interface
//!
//! This module handles:
//! - Building the HTTP client (cookie jar, timeouts, TLS trust)
//! - Sending one request and capturing a [`RawResponse`]
//! - Recognizing the appliance's session and login markers in responses
//! - Error classification

use crate::config::Config;
use crate::{PfError, RequestError};
use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Certificate, Client};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Form field carrying the anti-forgery token
pub const CSRF_FIELD: &str = "__csrf_magic";

/// The login form's username input; its presence means "not logged in"
pub const LOGIN_FORM_MARKER: &str = "name=\"usernamefld\"";

/// Banner shown after a rejected login
pub const LOGIN_FAILED_MARKER: &str = "Username or Password incorrect";

/// Link only rendered inside the authenticated area
pub const AUTHENTICATED_MARKER: &str = "index.php?logout";

/// Body returned when a form was posted with a stale token
pub const CSRF_FAILURE_MARKER: &str = "CSRF check failed";

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Everything needed to issue one request, independent of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,

    /// Path relative to the web interface root
    pub path: String,

    /// Form fields for POST requests
    pub form: Vec<(String, String)>,

    /// Query string parameters
    pub query: Vec<(String, String)>,

    /// Mark POSTs as XMLHttpRequest calls (`ajax=ajax` plus header)
    pub ajax: bool,
}

impl RequestSpec {
    pub fn get(path: &str) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.to_string(),
            form: Vec::new(),
            query: Vec::new(),
            ajax: false,
        }
    }

    pub fn post(path: &str) -> Self {
        Self {
            method: HttpMethod::Post,
            ajax: true,
            ..Self::get(path)
        }
    }

    pub fn with_form(mut self, key: &str, value: &str) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn without_ajax(mut self) -> Self {
        self.ajax = false;
        self
    }
}

/// Status, headers and body of one response; never retained past the call
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// Builds a response from a captured page, for parsers and tests
    pub fn from_body(body: &str) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed: a redirect from a status page is how the
/// appliance says the session is gone, and it has to be seen as such.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(PfError)` - The CA bundle could not be read or the client failed to build
pub fn build_http_client(config: &Config) -> Result<Client, PfError> {
    let mut builder = Client::builder()
        .user_agent(config.client.user_agent.clone())
        .timeout(Duration::from_secs(config.client.timeout_secs))
        .connect_timeout(Duration::from_secs(config.client.connect_timeout_secs))
        .redirect(Policy::none())
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .danger_accept_invalid_certs(!config.firewall.verify_tls);

    if let Some(path) = &config.firewall.ca_cert_path {
        let pem = std::fs::read(path)?;
        builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
    }

    Ok(builder.build()?)
}

/// Sends one request and captures the response
///
/// POST requests carry the anti-forgery token. No retry and no session
/// handling happens here.
pub async fn send(
    client: &Client,
    base_url: &Url,
    spec: &RequestSpec,
    csrf_token: Option<&str>,
) -> Result<RawResponse, RequestError> {
    let url = base_url
        .join(spec.path.trim_start_matches('/'))
        .map_err(|e| RequestError::Network {
            url: spec.path.clone(),
            message: format!("invalid path: {}", e),
        })?;
    let url_str = url.to_string();

    let mut builder = match spec.method {
        HttpMethod::Get => client.get(url),
        HttpMethod::Post => client.post(url),
    };

    if !spec.query.is_empty() {
        builder = builder.query(&spec.query);
    }

    if spec.method == HttpMethod::Post {
        let mut form = spec.form.clone();
        form.push((CSRF_FIELD.to_string(), csrf_token.unwrap_or_default().to_string()));
        if spec.ajax {
            form.push(("ajax".to_string(), "ajax".to_string()));
            builder = builder.header("X-Requested-With", "XMLHttpRequest");
        }
        builder = builder.form(&form);
    }

    tracing::trace!("{:?} {}", spec.method, url_str);
    let response = builder
        .send()
        .await
        .map_err(|e| classify_error(&url_str, e))?;

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| classify_error(&url_str, e))?;

    tracing::debug!("Response from {}: {} ({} bytes)", url_str, status, body.len());
    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> RequestError {
    if error.is_timeout() {
        RequestError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        RequestError::Network {
            url: url.to_string(),
            message: "connection refused".to_string(),
        }
    } else {
        RequestError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn access_denied_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*document\.location\.href\s*=\s*'https?://")
            .expect("access denied pattern is valid")
    })
}

fn csrf_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"sid:[^;"]*"#).expect("csrf pattern is valid"))
}

/// Scrapes the anti-forgery token (`sid:...`) from a page
pub fn extract_csrf_token(body: &str) -> Option<String> {
    csrf_pattern().find(body).map(|m| m.as_str().to_string())
}

/// Describes why a response means the session is no longer valid
///
/// The appliance rarely uses status codes for this: denied AJAX posts come
/// back as a JavaScript redirect, expired page views as the login form.
pub fn detect_expiry(response: &RawResponse) -> Option<String> {
    if response.is_redirect() {
        return Some(format!(
            "redirected to {}",
            response.location().unwrap_or("<no location>")
        ));
    }
    if response.status == 401 {
        return Some("HTTP 401".to_string());
    }
    if response.body.contains(LOGIN_FORM_MARKER) {
        return Some("login page returned".to_string());
    }
    if access_denied_pattern().is_match(&response.body) {
        return Some("access denied redirect".to_string());
    }
    if response.body.contains(CSRF_FAILURE_MARKER) {
        return Some("anti-forgery token rejected".to_string());
    }
    None
}

/// What a page says about a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    Rejected,
    Unrecognized,
}

/// Classifies the page shown after submitting credentials
pub fn classify_login(body: &str) -> LoginOutcome {
    if body.contains(LOGIN_FAILED_MARKER) {
        LoginOutcome::Rejected
    } else if body.contains(AUTHENTICATED_MARKER) {
        LoginOutcome::Authenticated
    } else if body.contains(LOGIN_FORM_MARKER) {
        LoginOutcome::Rejected
    } else {
        LoginOutcome::Unrecognized
    }
}
