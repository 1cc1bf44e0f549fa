//! HTTP front door: liveness at `/`, single-resource proxy at `/p/`.
//!
//! Both answer 200; forwarding failures are reported in the body text.

use std::future::Future;

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::forward::ProxyForwarder;

/// Body of the liveness response.
pub const GREETING: &str = "Hello from CookieProxy";

/// Query parameters of the proxy endpoint.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProxyParams {
    /// Absolute URL to fetch.
    pub target: Option<String>,
    /// HTTP method, `GET` when absent.
    pub method: Option<String>,
}

impl ProxyParams {
    /// Reads `target` and `method` from a raw query string.
    ///
    /// Never fails: the first occurrence of a repeated key wins and unknown
    /// keys are ignored.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "target" => &mut params.target,
                "method" => &mut params.method,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Builds the router. Any path other than `/p` and `/p/` is the liveness handler.
pub fn router(forwarder: ProxyForwarder) -> Router {
    Router::new()
        .route("/", any(liveness))
        .route("/p", any(proxy))
        .route("/p/", any(proxy))
        .fallback(liveness)
        .layer(TraceLayer::new_for_http())
        .with_state(forwarder)
}

/// Serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns the listener's I/O error if accepting connections fails.
pub async fn serve(
    listener: TcpListener,
    forwarder: ProxyForwarder,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "cookieproxy listening");
    }
    axum::serve(listener, router(forwarder))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn liveness(State(forwarder): State<ProxyForwarder>) -> Response {
    match forwarder.wait_ready().await {
        Ok(()) => GREETING.into_response(),
        Err(error) => (StatusCode::SERVICE_UNAVAILABLE, error.to_string()).into_response(),
    }
}

async fn proxy(
    State(forwarder): State<ProxyForwarder>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = ProxyParams::from_query(query.as_deref());
    match forwarder
        .forward(params.target.as_deref(), params.method.as_deref())
        .await
    {
        Ok(body) => body.into_response(),
        Err(error) => {
            warn!(error = %error, "forward failed");
            error.to_string().into_response()
        }
    }
}
