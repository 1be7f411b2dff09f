//! Many GETs against one URL, issued concurrently.
//!
//! Requests run with `block_on` on the current-thread runtime owned by
//! [`HttpTransport`](crate::HttpTransport), so callers stay synchronous.
//! Results come back in the order of the parameter list and the first
//! failure fails the whole batch.

use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client as AsyncClient;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::{Result, WqpError};
use crate::params::QueryParams;

/// Runs one GET per entry of `param_list` and returns the bodies in input order.
pub fn multi_query(
    runtime: &Runtime,
    http: &AsyncClient,
    url: &str,
    param_list: &[QueryParams],
    progress: bool,
) -> Result<Vec<String>> {
    if param_list.is_empty() {
        return Ok(Vec::new());
    }

    runtime.block_on(gather(http, url, param_list, progress))
}

async fn gather(
    http: &AsyncClient,
    url: &str,
    param_list: &[QueryParams],
    progress: bool,
) -> Result<Vec<String>> {
    debug!(url, requests = param_list.len(), "WQP multi-query");

    let pb = progress.then(|| {
        let pb = ProgressBar::new(param_list.len() as u64);
        let template = "{spinner:.green} {pos}/{len} {wide_bar} {eta}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    });

    let outputs = try_join_all(param_list.iter().map(|params| {
        let pb = pb.clone();
        async move {
            let text = fetch(http, url, params).await?;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            Ok::<_, WqpError>(text)
        }
    }))
    .await;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    outputs
}

async fn fetch(http: &AsyncClient, url: &str, params: &QueryParams) -> Result<String> {
    let resp = http.get(url).query(params).send().await?;
    let status = resp.status();
    let final_url = resp.url().to_string();
    if !status.is_success() {
        return Err(WqpError::Status {
            status,
            url: final_url,
            body: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp.text().await?)
}
