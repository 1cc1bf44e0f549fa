//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use cookieproxy_core::{DEFAULT_PORT, DEFAULT_REFRESH_SECS, REQUEST_TIMEOUT_SECS};

/// Forward requests upstream with periodically refreshed session cookies.
///
/// Cookies come from a Netscape-style cookie-jar file, a login request, or
/// both. Fetch `/p/?target=<url>&method=<verb>` to proxy a single resource.
#[derive(Parser, Debug)]
#[command(name = "cookieproxy")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Cookie-jar file re-read on every refresh
    #[arg(long, value_name = "PATH")]
    pub cookiejar: Option<PathBuf>,

    /// Address or hostname to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds between cookie refreshes (1-86400)
    #[arg(long, default_value_t = DEFAULT_REFRESH_SECS, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub refresh: u64,

    /// Login request as JSON (keys: Url, Method, Headers, Username, Password, Body)
    #[arg(long, value_name = "JSON")]
    pub request: Option<String>,

    /// Skip TLS certificate verification for login and forwarded requests
    #[arg(long)]
    pub insecure: bool,

    /// Total timeout per outbound request in seconds (1-600)
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: u64,
}

impl Args {
    /// Host and port the front door binds to; the host is resolved at bind time.
    pub fn listen_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
