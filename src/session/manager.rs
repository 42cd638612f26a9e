use super::state::SessionState;
use super::transport::{
    self, classify_login, detect_expiry, extract_csrf_token, LoginOutcome, RawResponse,
    RequestSpec,
};
use crate::config::{base_url, Config};
use crate::{AuthError, PfError, RequestError};
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

/// Web UI account used to log in
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    csrf_token: Option<String>,
    last_activity: Option<Instant>,

    /// Bumped on every successful login
    generation: u64,
}

impl SessionInner {
    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!("Unexpected session transition {} -> {}", self.state, next);
        }
        if self.state != next {
            tracing::debug!("Session {} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn is_idle(&self, limit: Option<Duration>) -> bool {
        match (limit, self.last_activity) {
            (Some(limit), Some(last)) => last.elapsed() > limit,
            _ => false,
        }
    }
}

/// Owns the authenticated session against the web interface
///
/// Cookies live in the client's jar; the anti-forgery token, state and
/// login generation live behind one async mutex. Logins run while holding
/// that mutex, so at most one is ever in flight and callers that notice an
/// expired session while another caller re-authenticates simply wait and
/// reuse the outcome.
///
/// Ordinary requests never hold the mutex while on the wire; their
/// concurrency is bounded by a semaphore instead.
#[derive(Debug)]
pub struct SessionManager {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    inner: Mutex<SessionInner>,
    permits: Semaphore,
    idle_timeout: Option<Duration>,
}

impl SessionManager {
    /// Creates an unauthenticated session for the configured firewall
    ///
    /// No network traffic happens until the first request or an explicit
    /// [`login`](Self::login).
    pub fn new(config: &Config) -> Result<Self, PfError> {
        let client = transport::build_http_client(config)?;
        let base_url = base_url(&config.firewall)?;

        Ok(Self {
            client,
            base_url,
            credentials: Credentials {
                username: config.firewall.username.clone(),
                password: config.firewall.password.clone(),
            },
            inner: Mutex::new(SessionInner {
                state: SessionState::Unauthenticated,
                csrf_token: None,
                last_activity: None,
                generation: 0,
            }),
            permits: Semaphore::new(config.client.max_concurrent_requests as usize),
            idle_timeout: config.client.session_idle_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn last_activity(&self) -> Option<Instant> {
        self.inner.lock().await.last_activity
    }

    /// Number of successful logins so far
    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    /// Logs in, replacing whatever session existed
    pub async fn login(&self) -> Result<(), AuthError> {
        let mut inner = self.inner.lock().await;
        self.login_locked(&mut inner).await
    }

    /// Ends the session on the appliance and forgets the local state
    ///
    /// The local state is reset even if the logout request fails.
    pub async fn logout(&self) -> Result<(), RequestError> {
        let mut inner = self.inner.lock().await;
        let was_authenticated = inner.state.is_authenticated();

        inner.transition(SessionState::Unauthenticated);
        inner.csrf_token = None;
        inner.last_activity = None;

        if !was_authenticated {
            return Ok(());
        }

        tracing::info!("Logging out of {}", self.base_url);
        transport::send(
            &self.client,
            &self.base_url,
            &RequestSpec::get("index.php?logout"),
            None,
        )
        .await?;
        Ok(())
    }

    /// Sends a request with the current session
    ///
    /// Logs in first when there is no session yet. If the response shows the
    /// session has expired, one re-login is performed and the request is
    /// sent exactly once more.
    ///
    /// # Returns
    ///
    /// * `Ok(RawResponse)` - A 2xx response from a valid session
    /// * `Err(RequestError::SessionExpired)` - Re-login failed, or the
    ///   retried request still came back expired
    /// * `Err(RequestError::Auth)` - The first login failed
    /// * `Err(RequestError)` - Transport failure or non-2xx status
    pub async fn execute(&self, spec: &RequestSpec) -> Result<RawResponse, RequestError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RequestError::Network {
                url: spec.path.clone(),
                message: e.to_string(),
            })?;

        let (token, generation) = self.ensure_authenticated().await?;
        let response =
            transport::send(&self.client, &self.base_url, spec, token.as_deref()).await?;

        let Some(reason) = detect_expiry(&response) else {
            return self.finish(spec, response).await;
        };

        tracing::warn!("Session expired while requesting {}: {}", spec.path, reason);
        let (token, _) = self.reauthenticate(generation).await?;
        let retried =
            transport::send(&self.client, &self.base_url, spec, token.as_deref()).await?;

        if let Some(reason) = detect_expiry(&retried) {
            tracing::error!("Session still invalid after re-login for {}: {}", spec.path, reason);
            let mut inner = self.inner.lock().await;
            if inner.state.is_authenticated() {
                inner.transition(SessionState::Expired);
            }
            return Err(RequestError::SessionExpired(AuthError::UnexpectedResponse(
                format!("session still invalid after re-login: {}", reason),
            )));
        }

        self.finish(spec, retried).await
    }

    async fn finish(
        &self,
        spec: &RequestSpec,
        response: RawResponse,
    ) -> Result<RawResponse, RequestError> {
        self.inner.lock().await.last_activity = Some(Instant::now());

        if !response.is_success() {
            return Err(RequestError::HttpStatus {
                url: spec.path.clone(),
                status: response.status,
            });
        }
        Ok(response)
    }

    /// Returns the token and generation to send with, logging in if needed
    async fn ensure_authenticated(&self) -> Result<(Option<String>, u64), RequestError> {
        let mut inner = self.inner.lock().await;

        if inner.state.is_authenticated() {
            if !inner.is_idle(self.idle_timeout) {
                return Ok((inner.csrf_token.clone(), inner.generation));
            }
            tracing::info!("Session idle past its limit, logging in again");
            inner.transition(SessionState::Expired);
        }

        let had_session = inner.generation > 0;
        self.login_locked(&mut inner).await.map_err(|e| {
            if had_session {
                RequestError::SessionExpired(e)
            } else {
                RequestError::Auth(e)
            }
        })?;
        Ok((inner.csrf_token.clone(), inner.generation))
    }

    /// Re-logs in after a request observed expiry
    ///
    /// `observed` is the generation the failed request was sent with. If it
    /// moved on while this caller waited for the lock, someone else already
    /// re-authenticated and that session is reused.
    async fn reauthenticate(&self, observed: u64) -> Result<(Option<String>, u64), RequestError> {
        let mut inner = self.inner.lock().await;

        if inner.generation != observed && inner.state.is_authenticated() {
            tracing::debug!("Reusing session from concurrent re-login");
            return Ok((inner.csrf_token.clone(), inner.generation));
        }

        if inner.state.is_authenticated() {
            inner.transition(SessionState::Expired);
        }
        self.login_locked(&mut inner)
            .await
            .map_err(RequestError::SessionExpired)?;
        Ok((inner.csrf_token.clone(), inner.generation))
    }

    /// Runs the login handshake; state is only committed once it succeeded
    async fn login_locked(&self, inner: &mut SessionInner) -> Result<(), AuthError> {
        match self.perform_login().await {
            Ok(token) => {
                inner.transition(SessionState::Authenticated);
                inner.csrf_token = Some(token);
                inner.last_activity = Some(Instant::now());
                inner.generation += 1;
                tracing::info!(
                    "Logged in to {} as {} (session {})",
                    self.base_url,
                    self.credentials.username,
                    inner.generation
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Login to {} failed: {}", self.base_url, e);
                inner.transition(SessionState::Unauthenticated);
                inner.csrf_token = None;
                Err(e)
            }
        }
    }

    async fn perform_login(&self) -> Result<String, AuthError> {
        let login_page = self.login_step(&RequestSpec::get("index.php"), None).await?;

        // The cookie jar may still hold a live session
        if login_page.is_success() && classify_login(&login_page.body) == LoginOutcome::Authenticated {
            if let Some(token) = extract_csrf_token(&login_page.body) {
                tracing::debug!("Existing session cookie is still valid");
                return Ok(token);
            }
        }

        if !login_page.is_success() {
            return Err(AuthError::UnexpectedResponse(format!(
                "login page returned HTTP {}",
                login_page.status
            )));
        }

        let token = extract_csrf_token(&login_page.body).ok_or_else(|| {
            AuthError::UnexpectedResponse("login page carries no anti-forgery token".to_string())
        })?;

        let submit = RequestSpec::post("index.php")
            .without_ajax()
            .with_form("usernamefld", &self.credentials.username)
            .with_form("passwordfld", &self.credentials.password)
            .with_form("login", "Sign In");
        let mut landing = self.login_step(&submit, Some(&token)).await?;

        if landing.is_redirect() {
            landing = self.login_step(&RequestSpec::get("index.php"), None).await?;
        }

        match classify_login(&landing.body) {
            LoginOutcome::Authenticated => {
                Ok(extract_csrf_token(&landing.body).unwrap_or(token))
            }
            LoginOutcome::Rejected => Err(AuthError::InvalidCredentials),
            LoginOutcome::Unrecognized => Err(AuthError::UnexpectedResponse(format!(
                "HTTP {} without login or dashboard markers",
                landing.status
            ))),
        }
    }

    async fn login_step(
        &self,
        spec: &RequestSpec,
        token: Option<&str>,
    ) -> Result<RawResponse, AuthError> {
        transport::send(&self.client, &self.base_url, spec, token)
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))
    }
}
