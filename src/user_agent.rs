//! User-Agent string for outbound login and forwarded requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/cookieproxy/cookieproxy";

/// Default User-Agent for every outbound request (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("cookieproxy/{version} (+{PROJECT_UA_URL})")
}
