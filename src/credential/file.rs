//! File strategy: re-reads the cookie-jar file every cycle.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{AcquisitionError, CredentialSource};
use crate::cookies::{CookieSet, parse_cookie_file};

/// Reads cookies from a tab-delimited cookie-jar file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for the given file. The file is not touched until
    /// the first [`acquire`](CredentialSource::acquire).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self), fields(source = "file", path = %self.path.display()))]
    async fn acquire(&self) -> Result<CookieSet, AcquisitionError> {
        // Single read per cycle; parsing works on the in-memory copy.
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AcquisitionError::io(&self.path, e))?;

        let parsed = parse_cookie_file(Cursor::new(contents))
            .map_err(|e| AcquisitionError::io(&self.path, e))?;

        info!(
            cookies = parsed.cookies.len(),
            skipped = parsed.warnings.len(),
            "loaded cookie file"
        );
        Ok(parsed.cookies)
    }
}
