//! Error types for cookie acquisition.

use std::path::PathBuf;

use thiserror::Error;

/// A refresh-cycle failure. Logged and retried on the next cycle; the
/// previously published snapshot stays in place.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Network-level failure talking to the login endpoint.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// Login URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The login request did not complete in time.
    #[error("timeout requesting {url}")]
    Timeout {
        /// Login URL.
        url: String,
    },

    /// The login endpoint answered with an error status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Login URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The cookie-jar file could not be opened or read.
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        /// Cookie file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl AcquisitionError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = AcquisitionError::http_status("https://gateway.local/login", 401);
        let msg = error.to_string();
        assert!(msg.contains("401"), "Expected '401' in: {msg}");
        assert!(msg.contains("https://gateway.local/login"));
    }

    #[test]
    fn test_io_display_names_path() {
        let error = AcquisitionError::io(
            "/tmp/missing-cookies.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(error.to_string().contains("/tmp/missing-cookies.txt"));
    }
}
