// src/load/mod.rs

//! Concurrent request generator with per-client session cookies.
//!
//! Each client runs as its own tokio task and keeps its own cookie; the only
//! shared state is the read-only [`LoadOptions`]. A client sends its requests
//! strictly one after another.

pub mod cookie;

use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::errors::{ClusterlabError, Result};

pub use cookie::{CookieSlot, session_cookie};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub url: String,
    /// Requests per client.
    pub requests: usize,
    pub clients: usize,
    /// How long a session cookie is kept before the client drops it.
    pub cookie_ttl: Duration,
}

impl LoadOptions {
    pub fn new(url: impl AsRef<str>) -> Self {
        Self {
            url: normalize_url(url.as_ref()),
            requests: 10,
            clients: 1,
            cookie_ttl: Duration::from_micros(1),
        }
    }
}

/// What one client observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub client: usize,
    /// Requests that got a response, whatever the status.
    pub sent: usize,
    /// Requests that failed at the transport level.
    pub failed: usize,
    /// Times a new session cookie was received.
    pub cookie_changes: usize,
    /// Times the held cookie was dropped for being older than the ttl.
    pub expirations: usize,
}

/// Accepts a bare host (`10.0.0.5`) as well as a full URL.
pub fn normalize_url(url: &str) -> String {
    let mut url = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };
    let has_path = url
        .split_once("://")
        .map(|(_, rest)| rest.contains('/'))
        .unwrap_or(false);
    if !has_path {
        url.push('/');
    }
    url
}

/// Run every client to completion and return their stats ordered by client
/// index.
pub async fn run_load(opts: LoadOptions) -> Result<Vec<ClientStats>> {
    if opts.clients == 0 {
        return Err(ClusterlabError::ConfigError(
            "load needs at least one client".to_string(),
        ));
    }

    let client = reqwest::Client::builder().build()?;
    let opts = Arc::new(opts);
    info!(url = %opts.url, clients = opts.clients, requests = opts.requests, "starting load");

    let mut tasks = JoinSet::new();
    for idx in 0..opts.clients {
        let http = client.clone();
        let opts = Arc::clone(&opts);
        tasks.spawn(async move { run_client(idx, http, opts).await });
    }

    let mut stats = Vec::with_capacity(opts.clients);
    while let Some(joined) = tasks.join_next().await {
        let s = joined.map_err(|e| anyhow::anyhow!("load client panicked: {e}"))?;
        stats.push(s);
    }
    stats.sort_by_key(|s| s.client);

    let sent: usize = stats.iter().map(|s| s.sent).sum();
    let failed: usize = stats.iter().map(|s| s.failed).sum();
    info!(sent, failed, "load finished");
    Ok(stats)
}

async fn run_client(idx: usize, http: reqwest::Client, opts: Arc<LoadOptions>) -> ClientStats {
    let mut stats = ClientStats {
        client: idx,
        ..ClientStats::default()
    };
    let mut slot = CookieSlot::new();

    for _ in 0..opts.requests {
        if slot.expire(opts.cookie_ttl, Instant::now()) {
            debug!(client = idx, "session cookie expired");
            stats.expirations += 1;
        }

        let mut request = http.get(&opts.url);
        if let Some(cookie) = slot.get() {
            request = request.header(COOKIE, cookie);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                warn!(client = idx, error = %err, "request failed");
                stats.failed += 1;
                continue;
            }
        };
        stats.sent += 1;

        let new_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(session_cookie);
        if let Some(cookie) = new_cookie {
            if slot.replace(cookie, Instant::now()) {
                debug!(client = idx, cookie = ?slot.get(), "session cookie changed");
                stats.cookie_changes += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_get_scheme_and_root_path() {
        assert_eq!(normalize_url("10.0.0.5"), "http://10.0.0.5/");
        assert_eq!(normalize_url("http://10.0.0.5"), "http://10.0.0.5/");
        assert_eq!(
            normalize_url("http://10.0.0.5:8080/app"),
            "http://10.0.0.5:8080/app"
        );
    }

    #[tokio::test]
    async fn zero_clients_is_rejected() {
        let mut opts = LoadOptions::new("127.0.0.1");
        opts.clients = 0;
        let err = run_load(opts).await.unwrap_err();
        assert!(matches!(err, ClusterlabError::ConfigError(_)));
    }
}
