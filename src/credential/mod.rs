//! Cookie acquisition from an external authority.
//!
//! - [`CredentialSource`] - async trait each acquisition strategy implements
//! - [`LoginSource`] - performs the authenticating HTTP exchange
//! - [`FileSource`] - reads a tab-delimited cookie-jar file
//!
//! When several sources are configured the refresher merges their results
//! with [`CookieSet::merged`] in the order returned by [`sources_from_settings`]:
//! login first, file last, so file records win on `(domain, path, name)`.

mod error;
mod file;
mod login;

pub use error::AcquisitionError;
pub use file::FileSource;
pub use login::LoginSource;

use async_trait::async_trait;

use crate::config::{ConfigurationError, ProxySettings};
use crate::cookies::CookieSet;

/// A strategy that produces a fresh [`CookieSet`].
///
/// Uses `async_trait` so the refresher can hold `Box<dyn CredentialSource>`.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short name for logs ("login", "file").
    fn name(&self) -> &str;

    /// Acquires a complete snapshot or fails the whole attempt.
    async fn acquire(&self) -> Result<CookieSet, AcquisitionError>;
}

/// Builds the enabled sources in merge-precedence order (lowest first).
///
/// # Errors
///
/// Returns [`ConfigurationError::NoCookieSource`] when nothing is enabled,
/// or the login source's construction error.
pub fn sources_from_settings(
    settings: &ProxySettings,
) -> Result<Vec<Box<dyn CredentialSource>>, ConfigurationError> {
    let mut sources: Vec<Box<dyn CredentialSource>> = Vec::new();

    if settings.query.is_enabled() {
        sources.push(Box::new(LoginSource::new(
            settings.query.clone(),
            &settings.http,
        )?));
    }
    if let Some(path) = &settings.cookie_file {
        sources.push(Box::new(FileSource::new(path.clone())));
    }

    if sources.is_empty() {
        return Err(ConfigurationError::NoCookieSource);
    }
    Ok(sources)
}
