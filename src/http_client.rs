//! Shared outbound HTTP client construction.
//!
//! Login and forward clients differ only in redirect policy; timeouts,
//! compression, user-agent and the TLS verification switch are common.

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::warn;

use crate::config::{ConfigurationError, HttpOptions};
use crate::user_agent;

/// Redirect handling for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Redirects {
    /// Follow redirects with reqwest's default limit.
    Follow,
    /// Return 3xx responses as-is (so their `Set-Cookie` headers are visible).
    Stop,
}

/// Builds a client from shared options.
///
/// # Errors
///
/// Returns [`ConfigurationError::HttpClient`] when the TLS backend or
/// system configuration prevents construction.
pub(crate) fn build_client(
    options: &HttpOptions,
    redirects: Redirects,
) -> Result<Client, ConfigurationError> {
    base_client_builder(options, redirects)
        .build()
        .map_err(|source| ConfigurationError::HttpClient { source })
}

fn base_client_builder(options: &HttpOptions, redirects: Redirects) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent());

    if redirects == Redirects::Stop {
        builder = builder.redirect(Policy::none());
    }

    if options.insecure_tls {
        warn!("TLS certificate verification disabled for outbound requests");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
}
