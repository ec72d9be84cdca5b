//! Byte transport for probes and archive fetches.
//!
//! The [`Fetcher`] trait is the only place the pipeline blocks on the
//! network. The production implementation is [`HttpFetcher`] (blocking
//! `ureq`, one shared agent); tests substitute the recording mock in
//! [`tests::MockFetcher`].
//!
//! ## Fallback chain
//!
//! [`fetch_with_fallback`] tries an ordered list of [`Transport`]s one after
//! another and stops at the first success. Probes never use it: a probe is a
//! single direct attempt. The archive stage uses it when
//! `archive.fallback_proxies` is configured.

use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("response larger than {0} bytes")]
    TooLarge(u64),
    #[error("empty response body")]
    Empty,
}

/// Retrieves the raw bytes behind a URL.
///
/// Implementations must be shareable across the worker pool and must give up
/// on their own once `timeout` has elapsed.
///
/// There is no cancel signal. A probe that times out or is cancelled stops
/// waiting but leaves its helper thread running this call, so `timeout` is
/// the only bound on how long that detached thread lives. An implementation
/// that ignores it leaks a thread per abandoned probe.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher backed by a shared `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().redirects(5).build(),
            user_agent: user_agent.into(),
            max_bytes,
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let resp = match self
            .agent
            .get(url)
            .timeout(timeout)
            .set("User-Agent", &self.user_agent)
            .call()
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(e) => return Err(FetchError::Transport(e.to_string())),
        };

        let mut body = Vec::new();
        resp.into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut body)?;
        if body.len() as u64 > self.max_bytes {
            return Err(FetchError::TooLarge(self.max_bytes));
        }
        if body.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(body)
    }
}

/// One path to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Fetch the candidate URL as-is.
    Direct,
    /// Fetch through a proxy; the template's `{url}` is replaced by the
    /// candidate URL.
    Proxy(String),
}

impl Transport {
    pub fn apply(&self, url: &str) -> String {
        match self {
            Transport::Direct => url.to_string(),
            Transport::Proxy(template) => template.replace("{url}", url),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Transport::Direct => "direct",
            Transport::Proxy(template) => template,
        }
    }
}

/// Build the transport chain: direct first, then each proxy in order.
pub fn transport_chain(proxies: &[String]) -> Vec<Transport> {
    std::iter::once(Transport::Direct)
        .chain(proxies.iter().cloned().map(Transport::Proxy))
        .collect()
}

/// Try each transport in order, returning the first successful payload.
///
/// Attempts are sequential. When every transport fails, the last error is
/// returned. An empty chain behaves like `[Transport::Direct]`.
pub fn fetch_with_fallback(
    fetcher: &dyn Fetcher,
    url: &str,
    transports: &[Transport],
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    if transports.is_empty() {
        return fetcher.fetch(url, timeout);
    }
    let mut last_err = None;
    for transport in transports {
        match fetcher.fetch(&transport.apply(url), timeout) {
            Ok(bytes) => {
                if last_err.is_some() {
                    tracing::debug!(url, transport = transport.label(), "fallback transport succeeded");
                }
                return Ok(bytes);
            }
            Err(e) => {
                tracing::warn!(url, transport = transport.label(), error = %e, "transport failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or(FetchError::Empty))
}
