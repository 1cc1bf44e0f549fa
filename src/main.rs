//! CLI entry point for cookieproxy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cookieproxy_core::{
    CookieStore, HttpOptions, ProxyForwarder, ProxySettings, QueryConfig, Refresher, server,
};
use tokio::net::{TcpListener, lookup_host};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(
        cookiejar = ?args.cookiejar,
        login = args.request.is_some(),
        refresh_secs = args.refresh,
        "CLI arguments parsed"
    );
    info!("CookieProxy starting");

    let query = QueryConfig::from_json(args.request.as_deref().unwrap_or_default())?;
    let http = HttpOptions {
        insecure_tls: args.insecure,
        request_timeout: Duration::from_secs(args.timeout),
        ..HttpOptions::default()
    };
    let settings = ProxySettings::new(args.cookiejar.clone(), query, args.refresh, http)?;

    let store = Arc::new(CookieStore::new());
    let refresher = Refresher::from_settings(&settings, Arc::clone(&store))?;
    let refresh_task = refresher.spawn();

    let forwarder = ProxyForwarder::new(store, &settings.http)?;

    let (host, port) = args.listen_addr();
    let addrs: Vec<_> = lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve listen host {host}"))?
        .collect();
    let listener = TcpListener::bind(addrs.as_slice())
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;

    server::serve(listener, forwarder, shutdown_signal()).await?;

    refresh_task.abort();
    info!("CookieProxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
