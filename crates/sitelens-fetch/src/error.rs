//! Error taxonomy for HTTP fetches.
//!
//! Categorization mirrors what checks need to distinguish: timeouts and
//! connection failures are retryable-or-tolerable, SSL failures are a
//! verdict of their own, and a non-2xx status is terminal data.

use thiserror::Error;

/// Errors that can occur while fetching.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request timed out
    #[error("request timed out")]
    Timeout,

    /// The redirect limit was exceeded
    #[error("too many redirects")]
    TooManyRedirects,

    /// Hostname could not be resolved
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// TLS/SSL-layer failure
    #[error("SSL error: {0}")]
    Ssl(String),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Any other HTTP-level failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl FetchError {
    /// Whether this error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether this error originated in the TLS layer.
    #[must_use]
    pub fn is_ssl(&self) -> bool {
        matches!(self, Self::Ssl(_))
    }
}

/// Categorize a `reqwest` error into the fetch taxonomy.
#[must_use]
pub fn categorize(error: &reqwest::Error) -> FetchError {
    let text = error.to_string();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        if text.contains("dns") {
            FetchError::Dns(text)
        } else if text.contains("certificate") || text.contains("ssl") || text.contains("tls") {
            FetchError::Ssl(text)
        } else {
            FetchError::Connect(text)
        }
    } else if text.contains("certificate") || text.contains("ssl") {
        FetchError::Ssl(text)
    } else if error.is_decode() {
        FetchError::Decode(text)
    } else {
        FetchError::Http(text)
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
