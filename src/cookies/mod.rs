//! Cookie records, snapshots and jar conversion.
//!
//! A [`CookieSet`] is the unit the refresher publishes and the forwarder reads.
//! It is never mutated after construction; scoping to a target URL goes
//! through a fresh `reqwest::cookie::Jar` built per request.

mod file;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore as _, Jar};
use reqwest::header::HeaderValue;
use tracing::{debug, instrument, warn};
use url::Url;

pub use file::{ParseError, ParseResult, parse_cookie_file, parse_secure_flag};

/// A single cookie as consumed by an HTTP client cookie jar.
///
/// The value is redacted in Debug output to keep session tokens out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieRecord {
    /// Domain the cookie belongs to (e.g. `api.example.com` or `.example.com`).
    pub domain: String,
    /// URL path scope.
    pub path: String,
    /// Only send over HTTPS.
    pub secure: bool,
    /// Lifetime in seconds (0 = session cookie, negative = expired).
    pub max_age_seconds: i64,
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
}

impl CookieRecord {
    /// Creates a new cookie record.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        secure: bool,
        max_age_seconds: i64,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
            secure,
            max_age_seconds,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive, avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn identity(&self) -> (&str, &str, &str) {
        (&self.domain, &self.path, &self.name)
    }
}

impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("max_age_seconds", &self.max_age_seconds)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// An immutable snapshot of cookie records valid for one refresh cycle.
///
/// Insertion order is preserved. Duplicates are allowed; when two records
/// share a domain, path and name the later one wins inside the jar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    records: Vec<CookieRecord>,
}

impl CookieSet {
    /// Creates a snapshot from records in order.
    #[must_use]
    pub fn new(records: Vec<CookieRecord>) -> Self {
        Self { records }
    }

    /// The empty snapshot held by a store before its first publish.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CookieRecord> {
        self.records.iter()
    }

    /// Number of distinct domains in the snapshot.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.domain.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Unions `overrides` into `self`.
    ///
    /// Records are keyed by `(domain, path, name)`. Every record of `self`
    /// whose key also appears in `overrides` is dropped; the survivors keep
    /// their order and all of `overrides` follows them.
    #[must_use]
    pub fn overlay(self, overrides: CookieSet) -> CookieSet {
        if self.is_empty() {
            return overrides;
        }
        let shadowed: HashSet<(&str, &str, &str)> =
            overrides.records.iter().map(CookieRecord::identity).collect();
        let mut records: Vec<CookieRecord> = self
            .records
            .iter()
            .filter(|record| !shadowed.contains(&record.identity()))
            .cloned()
            .collect();
        records.extend(overrides.records.iter().cloned());
        CookieSet { records }
    }

    /// Folds sets in precedence order: later sets win key collisions.
    #[must_use]
    pub fn merged(sets: impl IntoIterator<Item = CookieSet>) -> CookieSet {
        sets.into_iter().fold(CookieSet::empty(), CookieSet::overlay)
    }

    /// Loads every record into a fresh `reqwest` cookie jar.
    ///
    /// Each record becomes a `Set-Cookie` string added against its own origin
    /// URL, so the jar applies standard domain/path/secure matching on lookup.
    #[instrument(level = "debug", skip(self), fields(records = self.len()))]
    pub fn to_jar(&self) -> Arc<Jar> {
        let jar = Arc::new(Jar::default());

        for record in &self.records {
            let Some(origin) = origin_url(record) else {
                warn!(
                    domain = %record.domain,
                    name = %record.name,
                    "skipping cookie with unusable domain"
                );
                continue;
            };
            jar.add_cookie_str(&set_cookie_string(record), &origin);
        }

        jar
    }

    /// Computes the `Cookie` header this snapshot contributes to `url`.
    ///
    /// Returns `None` when no record matches the target.
    #[must_use]
    pub fn cookie_header_for(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.to_jar().cookies(url);
        debug!(
            target_url = %url,
            matched = header.as_ref().map_or(0, count_cookie_pairs),
            "scoped cookies for target"
        );
        header
    }
}

impl FromIterator<CookieRecord> for CookieSet {
    fn from_iter<I: IntoIterator<Item = CookieRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CookieSet {
    type Item = &'a CookieRecord;
    type IntoIter = std::slice::Iter<'a, CookieRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Builds a `Set-Cookie` header string from a record.
fn set_cookie_string(record: &CookieRecord) -> String {
    let mut parts = vec![
        format!("{}={}", record.name, record.value()),
        format!("Domain={}", record.domain),
        format!("Path={}", record.path),
    ];

    if record.secure {
        parts.push("Secure".to_string());
    }

    // 0 = session cookie, omit Max-Age
    if record.max_age_seconds != 0 {
        parts.push(format!("Max-Age={}", record.max_age_seconds));
    }

    parts.join("; ")
}

/// Origin URL used when adding a record to the jar.
///
/// `https` for secure records, `http` otherwise. The leading dot is stripped
/// from the domain. Returns `None` for an empty or unparseable domain.
fn origin_url(record: &CookieRecord) -> Option<Url> {
    let domain = record.domain.strip_prefix('.').unwrap_or(&record.domain);
    if domain.is_empty() {
        return None;
    }
    let scheme = if record.secure { "https" } else { "http" };
    let path = if record.path.starts_with('/') {
        record.path.as_str()
    } else {
        "/"
    };
    Url::parse(&format!("{scheme}://{domain}{path}")).ok()
}

fn count_cookie_pairs(header: &HeaderValue) -> usize {
    header
        .to_str()
        .map(|value| value.split("; ").filter(|pair| !pair.is_empty()).count())
        .unwrap_or(0)
}
