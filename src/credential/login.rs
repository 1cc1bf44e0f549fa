//! Login strategy: obtains cookies from an authenticating HTTP exchange.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tracing::{debug, info, instrument};
use url::Url;

use super::{AcquisitionError, CredentialSource};
use crate::config::{ConfigurationError, HttpOptions, QueryConfig};
use crate::cookies::{CookieRecord, CookieSet};
use crate::http_client::{Redirects, build_client};

/// Performs one login request per cycle and collects its `Set-Cookie` headers.
///
/// Redirects are not followed: login endpoints often answer `302` with the
/// session cookie attached, and the redirect target never sees it.
#[derive(Debug, Clone)]
pub struct LoginSource {
    query: QueryConfig,
    url: Url,
    host: String,
    method: Method,
    headers: HeaderMap,
    client: Client,
}

impl LoginSource {
    /// Validates the query and builds the login client.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an unparseable URL, method or
    /// header, or when the HTTP client cannot be built.
    pub fn new(query: QueryConfig, options: &HttpOptions) -> Result<Self, ConfigurationError> {
        let url = Url::parse(query.url.trim()).map_err(|_| ConfigurationError::InvalidLoginUrl {
            url: query.url.clone(),
        })?;
        let host = url
            .host_str()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or_else(|| ConfigurationError::InvalidLoginUrl {
                url: query.url.clone(),
            })?;

        let method = parse_method(&query.method)?;
        let headers = build_headers(&query)?;
        let client = build_client(options, Redirects::Stop)?;

        Ok(Self {
            query,
            url,
            host,
            method,
            headers,
            client,
        })
    }

    fn to_record(&self, cookie: &reqwest::cookie::Cookie<'_>) -> CookieRecord {
        let domain = cookie
            .domain()
            .filter(|domain| !domain.is_empty())
            .unwrap_or(self.host.as_str());
        let path = cookie.path().filter(|path| !path.is_empty()).unwrap_or("/");

        CookieRecord::new(
            domain,
            path,
            cookie.secure(),
            lifetime_seconds(cookie.max_age(), cookie.expires(), SystemTime::now()),
            cookie.name(),
            cookie.value(),
        )
    }
}

#[async_trait]
impl CredentialSource for LoginSource {
    fn name(&self) -> &'static str {
        "login"
    }

    #[instrument(skip(self), fields(source = "login", url = %self.url, method = %self.method))]
    async fn acquire(&self) -> Result<CookieSet, AcquisitionError> {
        let mut request = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if !self.query.username.is_empty() {
            request = request.basic_auth(&self.query.username, Some(&self.query.password));
        }
        if !self.query.body.is_empty() {
            request = request.body(self.query.body.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AcquisitionError::from_request(self.url.as_str(), e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AcquisitionError::http_status(
                self.url.as_str(),
                status.as_u16(),
            ));
        }

        let cookies: CookieSet = response
            .cookies()
            .map(|cookie| {
                let record = self.to_record(&cookie);
                debug!(domain = %record.domain, name = %record.name, "received login cookie");
                record
            })
            .collect();

        info!(
            status = status.as_u16(),
            cookies = cookies.len(),
            "login request complete"
        );
        Ok(cookies)
    }
}

fn parse_method(raw: &str) -> Result<Method, ConfigurationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Method::POST);
    }
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|_| {
        ConfigurationError::InvalidLoginMethod {
            method: raw.to_string(),
        }
    })
}

/// Configured headers, plus `Content-Type: application/json` unless one is set.
fn build_headers(query: &QueryConfig) -> Result<HeaderMap, ConfigurationError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &query.headers {
        let invalid = || ConfigurationError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(header_name, header_value);
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}

/// Maps cookie lifetime attributes onto the record's seconds field.
///
/// `Max-Age` wins over `Expires`. Neither yields 0 (session). An already
/// expired cookie yields -1 so the jar drops it instead of keeping it for
/// the session.
fn lifetime_seconds(
    max_age: Option<Duration>,
    expires: Option<SystemTime>,
    now: SystemTime,
) -> i64 {
    let remaining = match (max_age, expires) {
        (Some(max_age), _) => max_age,
        (None, Some(expires)) => expires.duration_since(now).unwrap_or(Duration::ZERO),
        (None, None) => return 0,
    };
    if remaining.is_zero() {
        return -1;
    }
    i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX).max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(url: &str) -> QueryConfig {
        QueryConfig {
            url: url.to_string(),
            ..QueryConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_unparseable_url() {
        let result = LoginSource::new(query("not a url"), &HttpOptions::default());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidLoginUrl { .. })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_header() {
        let mut config = query("https://gateway.local/login");
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        let result = LoginSource::new(config, &HttpOptions::default());
        assert!(matches!(result, Err(ConfigurationError::InvalidHeader { .. })));
    }

    #[test]
    fn test_parse_method_defaults_to_post() {
        assert_eq!(parse_method("").unwrap(), Method::POST);
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert!(parse_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_build_headers_adds_json_content_type() {
        let headers = build_headers(&query("https://x")).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_build_headers_keeps_configured_content_type() {
        let mut config = query("https://x");
        config.headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        let headers = build_headers(&config).unwrap();
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_lifetime_seconds_prefers_max_age() {
        let now = SystemTime::now();
        let expires = now + Duration::from_secs(10);
        assert_eq!(
            lifetime_seconds(Some(Duration::from_secs(3600)), Some(expires), now),
            3600
        );
    }

    #[test]
    fn test_lifetime_seconds_from_expires() {
        let now = SystemTime::now();
        let expires = now + Duration::from_secs(120);
        assert_eq!(lifetime_seconds(None, Some(expires), now), 120);
    }

    #[test]
    fn test_lifetime_seconds_session_and_expired() {
        let now = SystemTime::now();
        assert_eq!(lifetime_seconds(None, None, now), 0);
        assert_eq!(lifetime_seconds(Some(Duration::ZERO), None, now), -1);
        let past = now - Duration::from_secs(60);
        assert_eq!(lifetime_seconds(None, Some(past), now), -1);
    }
}
