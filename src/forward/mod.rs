//! Per-request forwarding with cookie injection.
//!
//! The forwarder reads the current snapshot once per request, scopes it to
//! the target with standard cookie-jar matching, and buffers the upstream
//! body. Upstream status and headers are not propagated.

mod error;

pub use error::ForwardError;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::COOKIE;
use reqwest::{Client, Method};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{ConfigurationError, HttpOptions};
use crate::http_client::{Redirects, build_client};
use crate::store::CookieStore;

/// Forwards single requests upstream with the current cookies attached.
///
/// Cheap to clone; clones share the connection pool and the store.
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    store: Arc<CookieStore>,
    client: Client,
    ready_timeout: Duration,
}

impl ProxyForwarder {
    /// Creates a forwarder reading from `store`.
    ///
    /// The readiness wait is bounded by the request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::HttpClient`] when the client cannot be built.
    pub fn new(store: Arc<CookieStore>, options: &HttpOptions) -> Result<Self, ConfigurationError> {
        Ok(Self {
            store,
            client: build_client(options, Redirects::Follow)?,
            ready_timeout: options.request_timeout,
        })
    }

    /// Waits for the first published snapshot, bounded like a request.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::NotReady`] when nothing was published in time.
    pub async fn wait_ready(&self) -> Result<(), ForwardError> {
        if self.store.wait_ready(self.ready_timeout).await {
            Ok(())
        } else {
            Err(ForwardError::NotReady {
                waited_secs: self.ready_timeout.as_secs(),
            })
        }
    }

    /// Fetches `target` with `method` (default `GET`) and returns the body.
    ///
    /// A missing or blank target is a no-op that returns an empty body.
    ///
    /// # Errors
    ///
    /// Returns a [`ForwardError`] for an invalid target or method, when the
    /// store never became ready, or when sending or reading the body fails.
    #[instrument(skip(self))]
    pub async fn forward(
        &self,
        target: Option<&str>,
        method: Option<&str>,
    ) -> Result<Bytes, ForwardError> {
        let Some(target) = target.map(str::trim).filter(|target| !target.is_empty()) else {
            debug!("no target given; returning empty body");
            return Ok(Bytes::new());
        };

        self.wait_ready().await?;

        let method = parse_method(method)?;
        let url = parse_target(target)?;

        let snapshot = self.store.current();
        let mut request = self.client.request(method.clone(), url.clone());
        let cookie_header = snapshot.cookie_header_for(&url);
        let cookies_sent = cookie_header.is_some();
        if let Some(cookie_header) = cookie_header {
            request = request.header(COOKIE, cookie_header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ForwardError::request(target, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::body(target, e))?;

        info!(
            %method,
            status = status.as_u16(),
            bytes = body.len(),
            cookies_sent,
            "forwarded request"
        );
        Ok(body)
    }
}

fn parse_method(raw: Option<&str>) -> Result<Method, ForwardError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| ForwardError::invalid_method(raw))
}

fn parse_target(target: &str) -> Result<Url, ForwardError> {
    let url = Url::parse(target).map_err(|e| ForwardError::invalid_url(target, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ForwardError::invalid_url(
                target,
                format!("unsupported scheme '{other}'"),
            ));
        }
    }
    if url.host_str().is_none() {
        return Err(ForwardError::invalid_url(target, "missing host"));
    }
    Ok(url)
}
