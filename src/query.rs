//! Single blocking GET.

use reqwest::blocking::Client as HttpClient;
use tracing::debug;

use crate::error::{Result, WqpError};
use crate::params::QueryParams;

/// Issues one GET and returns the body; any non-2xx status is an error.
pub fn basic_query(http: &HttpClient, url: &str, params: &QueryParams) -> Result<String> {
    debug!(url, params = params.len(), "WQP query");

    let resp = http.get(url).query(params).send()?;
    let status = resp.status();
    let final_url = resp.url().to_string();
    if !status.is_success() {
        return Err(WqpError::Status {
            status,
            url: final_url,
            body: resp.text().unwrap_or_default(),
        });
    }
    Ok(resp.text()?)
}
