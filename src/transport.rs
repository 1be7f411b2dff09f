//! The HTTP seam used by [`Connection`](crate::Connection).

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::concurrent::multi_query;
use crate::error::Result;
use crate::params::QueryParams;
use crate::query::basic_query;

/// Fetches raw response bodies.
///
/// Implemented by [`HttpTransport`]; tests substitute a recording fake.
pub trait Transport {
    /// One GET; non-2xx must be reported as an error.
    fn get(&self, url: &str, params: &QueryParams) -> Result<String>;

    /// One GET per parameter set, bodies returned in input order.
    fn get_all(&self, url: &str, param_list: &[QueryParams]) -> Result<Vec<String>>;
}

/// Options for building an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Show a progress bar while a batch is in flight.
    pub progress: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            verify: true,
            progress: false,
        }
    }
}

/// `reqwest`-backed transport: blocking client for single queries, async
/// client on a private current-thread runtime for batches.
///
/// Must not be used from inside another async runtime; wrap calls in
/// `tokio::task::spawn_blocking` there.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    blocking: reqwest::blocking::Client,
    concurrent: reqwest::Client,
    runtime: Arc<Runtime>,
    progress: bool,
}

impl HttpTransport {
    /// Builds both HTTP clients and the runtime that drives batches.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("wqp-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("wqp-rs")),
        );

        let blocking = reqwest::blocking::Client::builder()
            .default_headers(default_headers.clone())
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify)
            .build()?;
        let concurrent = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify)
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            blocking,
            concurrent,
            runtime: Arc::new(runtime),
            progress: config.progress,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, params: &QueryParams) -> Result<String> {
        basic_query(&self.blocking, url, params)
    }

    fn get_all(&self, url: &str, param_list: &[QueryParams]) -> Result<Vec<String>> {
        multi_query(&self.runtime, &self.concurrent, url, param_list, self.progress)
    }
}
