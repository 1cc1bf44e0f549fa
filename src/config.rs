//! Runtime configuration: the login request description and proxy settings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default refresh interval between cookie acquisitions.
pub const DEFAULT_REFRESH_SECS: u64 = 120;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8675;

/// Default HTTP connect timeout for outbound calls.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total timeout for a single outbound call.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Startup-level misconfiguration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Neither a cookie file nor a login URL was configured.
    #[error("no cookie source configured: set a cookie file path or a request Url")]
    NoCookieSource,

    /// The refresh interval must be at least one second.
    #[error("invalid refresh interval: {seconds} seconds")]
    InvalidRefreshInterval {
        /// Rejected interval.
        seconds: u64,
    },

    /// The `--request` JSON could not be parsed into a [`QueryConfig`].
    #[error("invalid request JSON: {source}")]
    InvalidQuery {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The login URL does not parse.
    #[error("invalid login URL: {url}")]
    InvalidLoginUrl {
        /// Rejected URL.
        url: String,
    },

    /// The login method is not a valid HTTP method token.
    #[error("invalid login method: {method}")]
    InvalidLoginMethod {
        /// Rejected method.
        method: String,
    },

    /// A configured login header has an invalid name or value.
    #[error("invalid login header '{name}'")]
    InvalidHeader {
        /// Offending header name.
        name: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

/// Describes the authenticating request used to obtain cookies.
///
/// Field names match the JSON keys exactly (`Headers`, `Username`, ...).
/// Every field is optional.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QueryConfig {
    /// Extra request headers.
    pub headers: HashMap<String, String>,
    /// Basic-auth user, applied when non-empty.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Request body.
    pub body: String,
    /// Login endpoint; empty disables the login strategy.
    pub url: String,
    /// HTTP method; empty means `POST`.
    pub method: String,
}

impl QueryConfig {
    /// Parses the `--request` JSON blob. Blank input yields the empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidQuery`] for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|source| ConfigurationError::InvalidQuery { source })
    }

    /// Whether this config enables the login strategy.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

// Password and body usually carry credentials.
impl std::fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryConfig")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("body", &"[REDACTED]")
            .field("url", &self.url)
            .field("method", &self.method)
            .finish()
    }
}

/// Timeouts and TLS policy shared by every outbound client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    /// Skip TLS certificate verification. Off unless explicitly requested.
    pub insecure_tls: bool,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Total timeout for one request including the body.
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            insecure_tls: false,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Validated settings the binary wires the proxy from.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Cookie-jar file read every cycle.
    pub cookie_file: Option<PathBuf>,
    /// Login request description.
    pub query: QueryConfig,
    /// Time between refresh cycles.
    pub refresh_interval: Duration,
    /// Outbound HTTP policy.
    pub http: HttpOptions,
}

impl ProxySettings {
    /// Builds settings, rejecting configurations the refresher cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoCookieSource`] when neither source is
    /// configured and [`ConfigurationError::InvalidRefreshInterval`] for a
    /// zero interval.
    pub fn new(
        cookie_file: Option<PathBuf>,
        query: QueryConfig,
        refresh_secs: u64,
        http: HttpOptions,
    ) -> Result<Self, ConfigurationError> {
        let cookie_file = cookie_file.filter(|path| !path.as_os_str().is_empty());
        if cookie_file.is_none() && !query.is_enabled() {
            return Err(ConfigurationError::NoCookieSource);
        }
        if refresh_secs == 0 {
            return Err(ConfigurationError::InvalidRefreshInterval {
                seconds: refresh_secs,
            });
        }
        Ok(Self {
            cookie_file,
            query,
            refresh_interval: Duration::from_secs(refresh_secs),
            http,
        })
    }
}
