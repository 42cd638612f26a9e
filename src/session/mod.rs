//! Session management for the web interface
//!
//! This module contains:
//! - The login handshake and anti-forgery token handling
//! - Expiry detection and single-flight re-authentication
//! - The HTTP transport the rest of the crate sends requests through

mod manager;
mod state;
mod transport;

pub use manager::{Credentials, SessionManager};
pub use state::SessionState;
pub use transport::{
    build_http_client, classify_login, detect_expiry, extract_csrf_token, HttpMethod,
    LoginOutcome, RawResponse, RequestSpec,
};
