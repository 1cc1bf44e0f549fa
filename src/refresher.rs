//! Background refresh loop: acquire, merge, publish, sleep, repeat.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigurationError, ProxySettings};
use crate::cookies::CookieSet;
use crate::credential::{AcquisitionError, CredentialSource, sources_from_settings};
use crate::store::CookieStore;

/// Phase of a refresh cycle, traced on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Acquiring,
    Merging,
    Publishing,
    Sleeping,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Merging => "merging",
            Self::Publishing => "publishing",
            Self::Sleeping => "sleeping",
        };
        f.write_str(label)
    }
}

/// Sole writer of a [`CookieStore`].
///
/// Sources are held in merge-precedence order; later sources win
/// `(domain, path, name)` collisions.
pub struct Refresher {
    sources: Vec<Box<dyn CredentialSource>>,
    store: Arc<CookieStore>,
    interval: Duration,
}

impl fmt::Debug for Refresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Refresher {
    /// Creates a refresher over explicit sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoCookieSource`] for an empty source
    /// list and [`ConfigurationError::InvalidRefreshInterval`] for a zero
    /// interval.
    pub fn new(
        sources: Vec<Box<dyn CredentialSource>>,
        store: Arc<CookieStore>,
        interval: Duration,
    ) -> Result<Self, ConfigurationError> {
        if sources.is_empty() {
            return Err(ConfigurationError::NoCookieSource);
        }
        if interval.is_zero() {
            return Err(ConfigurationError::InvalidRefreshInterval { seconds: 0 });
        }
        Ok(Self {
            sources,
            store,
            interval,
        })
    }

    /// Creates a refresher with the sources the settings enable.
    ///
    /// # Errors
    ///
    /// Returns the configuration errors of [`sources_from_settings`] and
    /// [`Refresher::new`].
    pub fn from_settings(
        settings: &ProxySettings,
        store: Arc<CookieStore>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            sources_from_settings(settings)?,
            store,
            settings.refresh_interval,
        )
    }

    /// Runs one cycle without sleeping.
    ///
    /// Publishes only when every source succeeded; on failure the previous
    /// snapshot stays in the store.
    ///
    /// # Errors
    ///
    /// Returns the first source failure of the cycle.
    #[instrument(level = "debug", skip(self), fields(generation = self.store.generation()))]
    pub async fn refresh_once(&self) -> Result<usize, AcquisitionError> {
        trace_phase(RefreshPhase::Acquiring);
        let mut acquired = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let cookies = source.acquire().await.inspect_err(|error| {
                warn!(source = source.name(), error = %error, "cookie acquisition failed");
            })?;
            debug!(source = source.name(), cookies = cookies.len(), "acquired cookies");
            acquired.push(cookies);
        }

        trace_phase(RefreshPhase::Merging);
        let merged = CookieSet::merged(acquired);
        let count = merged.len();
        let domains = merged.domain_count();

        trace_phase(RefreshPhase::Publishing);
        self.store.publish(merged);
        info!(cookies = count, domains, "refreshed cookies");
        Ok(count)
    }

    /// Refreshes forever. Failed cycles are logged and retried after the
    /// normal interval.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            sources = self.sources.len(),
            "cookie refresher started"
        );
        loop {
            trace_phase(RefreshPhase::Idle);
            if let Err(error) = self.refresh_once().await {
                warn!(error = %error, "refresh cycle failed; keeping previous cookies");
            }
            trace_phase(RefreshPhase::Sleeping);
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Spawns [`run`](Self::run) on the current tokio runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

fn trace_phase(phase: RefreshPhase) {
    debug!(%phase, "refresh phase");
}
