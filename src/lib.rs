//! CookieProxy Core Library
//!
//! A forwarding proxy that keeps a fresh set of session cookies and attaches
//! them to requests it relays to cookie-authenticated HTTP APIs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`cookies`] - Cookie records, immutable snapshots and the cookie-jar file format
//! - [`config`] - Login request description and validated proxy settings
//! - [`credential`] - Cookie acquisition from a login endpoint or a file
//! - [`store`] - Atomically swapped snapshot with a readiness gate
//! - [`refresher`] - Background loop that acquires, merges and publishes
//! - [`forward`] - Per-request forwarding with cookie injection
//! - [`server`] - axum front door (liveness and proxy endpoints)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod cookies;
pub mod credential;
pub mod forward;
mod http_client;
pub mod refresher;
pub mod server;
pub mod store;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{
    CONNECT_TIMEOUT_SECS, ConfigurationError, DEFAULT_PORT, DEFAULT_REFRESH_SECS, HttpOptions,
    ProxySettings, QueryConfig, REQUEST_TIMEOUT_SECS,
};
pub use cookies::{CookieRecord, CookieSet, ParseError, ParseResult, parse_cookie_file};
pub use credential::{AcquisitionError, CredentialSource, FileSource, LoginSource};
pub use forward::{ForwardError, ProxyForwarder};
pub use refresher::{RefreshPhase, Refresher};
pub use store::CookieStore;
