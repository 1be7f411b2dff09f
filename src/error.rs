use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for Water Quality Portal operations.
pub type Result<T> = std::result::Result<T, WqpError>;

/// Errors returned by the client.
#[derive(Error, Debug)]
pub enum WqpError {
    /// Unknown database/program, or configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// Call arguments were rejected before any request was sent.
    #[error("invalid arguments: {0}")]
    Validation(String),

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{}", format_status(*status, url, body))]
    Status {
        /// Response status.
        status: StatusCode,
        /// Requested URL, including the query string.
        url: String,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body is not a well-formed delimited table.
    #[error("failed to parse delimited response: {0}")]
    Parse(#[from] csv::Error),

    /// The runtime driving concurrent requests could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The connectivity check performed by `Connection::connect` failed.
    #[error("could not connect to WQP at {0}")]
    Unreachable(String),
}

impl WqpError {
    /// Returns the HTTP status if this error came from a non-success response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

fn format_status(status: StatusCode, url: &str, body: &str) -> String {
    if status == StatusCode::NOT_FOUND {
        return format!(
            "WQP endpoint not found (HTTP 404).\n- The service path may have changed, or the configured base URL is incorrect\nrequest: {}",
            url
        );
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return format!(
            "WQP refused the request (HTTP {}).\n- Check that the selected database is reachable from this network\n\nServer message: {}\nrequest: {}",
            status.as_u16(),
            body.trim(),
            url
        );
    }

    let body = body.trim();
    if body.is_empty() {
        format!("API request failed: HTTP {} for url ({})", status.as_u16(), url)
    } else {
        format!(
            "API request failed: HTTP {} for url ({})\n{}",
            status.as_u16(),
            url,
            body
        )
    }
}
