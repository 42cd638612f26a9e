use super::registry::{self, EndpointDescriptor, HEALTH_ENDPOINTS};
use crate::config::Config;
use crate::parsers::Record;
use crate::session::{RawResponse, SessionManager};
use crate::{PfError, RequestError};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Outcome per endpoint id; one endpoint failing never hides the others
pub type SystemStats = BTreeMap<String, Result<Record, PfError>>;

/// Read-only client for one firewall
///
/// Cloning is cheap and clones share the session, so concurrent calls reuse
/// one login.
///
/// # Example
///
/// ```no_run
/// use pfsense_watch::{config::load_config, PfSenseClient};
/// use std::path::Path;
///
/// # async fn run() -> pfsense_watch::Result<()> {
/// let config = load_config(Path::new("pfsense-watch.toml"))?;
/// let client = PfSenseClient::new(&config)?;
/// let record = client.call_api("gateways").await?;
/// println!("{:?}", record);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PfSenseClient {
    session: Arc<SessionManager>,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl PfSenseClient {
    pub fn new(config: &Config) -> Result<Self, PfError> {
        Ok(Self {
            session: Arc::new(SessionManager::new(config)?),
            retry_attempts: config.client.retry_attempts,
            retry_backoff: Duration::from_millis(config.client.retry_backoff_ms),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Logs in ahead of the first request
    pub async fn login(&self) -> Result<(), PfError> {
        Ok(self.session.login().await?)
    }

    pub async fn logout(&self) -> Result<(), PfError> {
        Ok(self.session.logout().await?)
    }

    /// Ids accepted by [`call_api`](Self::call_api)
    pub fn supported_endpoints(&self) -> Vec<&'static str> {
        registry::supported_endpoints()
    }

    /// Fetches one endpoint and normalizes it into its record
    ///
    /// Transient transport failures are retried with linear backoff. Parse
    /// failures are returned as [`PfError::Parse`] straight away; fetching
    /// the same page again would not change the result.
    pub async fn call_api(&self, endpoint_id: &str) -> Result<Record, PfError> {
        let descriptor = registry::resolve(endpoint_id)?;
        let response = self.fetch(descriptor).await?;

        (descriptor.parser)(&response).map_err(|cause| {
            tracing::error!("Failed to parse {}: {}", endpoint_id, cause);
            PfError::Parse {
                endpoint_id: endpoint_id.to_string(),
                cause,
            }
        })
    }

    async fn fetch(&self, descriptor: &EndpointDescriptor) -> Result<RawResponse, RequestError> {
        let spec = descriptor.request();
        let mut attempt = 1;

        loop {
            tracing::debug!("Fetching {} (attempt {})", descriptor.id, attempt);
            match self.session.execute(&spec).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    let delay = self.retry_backoff * attempt;
                    tracing::warn!(
                        "Attempt {} for {} failed: {}. Retrying in {:?}",
                        attempt,
                        descriptor.id,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on {} after {} attempt(s): {}", descriptor.id, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    /// Polls the health endpoints concurrently
    ///
    /// Covers `general`, `software_system`, `thermal` and `disks`. Dropping
    /// the returned future abandons the fetches still in flight.
    pub async fn system_stats(&self) -> SystemStats {
        self.collect(HEALTH_ENDPOINTS).await
    }

    /// Polls every registered endpoint concurrently
    pub async fn all_system_stats(&self) -> SystemStats {
        self.collect(&registry::supported_endpoints()).await
    }

    async fn collect(&self, endpoint_ids: &[&'static str]) -> SystemStats {
        let client = self.clone();
        gather(endpoint_ids, move |id| {
            let client = client.clone();
            async move { client.call_api(id).await }
        })
        .await
    }
}

/// Runs one task per endpoint and keys every outcome by its id
///
/// A task that panics or is cancelled still leaves an entry, as
/// [`PfError::Task`].
async fn gather<F, Fut>(endpoint_ids: &[&'static str], fetch: F) -> SystemStats
where
    F: Fn(&'static str) -> Fut,
    Fut: Future<Output = Result<Record, PfError>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for &id in endpoint_ids {
        let fetching = fetch(id);
        tasks.spawn(async move { (id, fetching.await) });
    }

    let mut pending: BTreeSet<&'static str> = endpoint_ids.iter().copied().collect();
    let mut stats = SystemStats::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, outcome)) => {
                if let Err(e) = &outcome {
                    tracing::warn!("{} unavailable: {}", id, e);
                }
                pending.remove(id);
                stats.insert(id.to_string(), outcome);
            }
            Err(e) => {
                tracing::error!("Endpoint task failed: {}", e);
                failures.push(e.to_string());
            }
        }
    }

    // A failed task loses its id, so the leftovers are the failed endpoints
    let reason = failures.join("; ");
    for id in pending {
        stats.insert(
            id.to_string(),
            Err(PfError::Task {
                endpoint_id: id.to_string(),
                reason: reason.clone(),
            }),
        );
    }
    stats
}
