//! Error types for forwarded requests.
//!
//! Every variant is rendered inline to the caller as text; none of them
//! affect other requests or the refresher.

use thiserror::Error;

/// Failures while forwarding one request upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The target does not parse as an absolute http(s) URL.
    #[error("invalid target URL {url}: {reason}")]
    InvalidUrl {
        /// Target as received.
        url: String,
        /// What was wrong.
        reason: String,
    },

    /// The method is not a valid HTTP method token.
    #[error("invalid method: {method}")]
    InvalidMethod {
        /// Method as received.
        method: String,
    },

    /// No cookie snapshot was published within the wait window.
    #[error("cookie store not ready after {waited_secs}s")]
    NotReady {
        /// Seconds waited.
        waited_secs: u64,
    },

    /// Sending the request failed (DNS, connect, TLS, ...).
    #[error("error sending request to {url}: {source}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The upstream did not answer within the request timeout.
    #[error("timeout requesting {url}")]
    Timeout {
        /// Target URL.
        url: String,
    },

    /// The response body could not be read completely.
    #[error("error reading body from {url}: {source}")]
    Body {
        /// Target URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

impl ForwardError {
    /// Creates an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-method error.
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    /// Creates a send error, promoting timeouts.
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Request {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a body-read error, promoting timeouts.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Body {
                url: url.into(),
                source,
            }
        }
    }
}
