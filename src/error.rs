// src/error.rs
// =============================================================================
// Error types shared by the fetch and crawl layers.
//
// Two families:
// - FetchError: one network call went wrong (search page or a crawled site)
// - CrawlError: the crawl request itself was invalid and nothing was started
//
// Per-page FetchErrors never leave a worker; they are logged and the page
// simply contributes no libraries. Only CrawlError reaches the caller as Err.
// =============================================================================

use thiserror::Error;

/// Why a single fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not finish within its timeout
    #[error("request timed out")]
    Timeout,
    /// Could not connect (DNS, refused connection, TLS handshake, ...)
    #[error("connection failed: {0}")]
    Connect(String),
    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),
    /// The body was bigger than the configured page size limit
    #[error("page larger than {0} bytes")]
    TooLarge(usize),
    /// The URL could not be parsed or built
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
    /// Anything else (body decoding, redirect loops, ...)
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    // Same triage as a link checker would do: timeouts and connection
    // problems get their own variant, everything else keeps its message.
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_connect() {
            FetchError::Connect(error.to_string())
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else if error.is_redirect() {
            FetchError::Other("too many redirects".to_string())
        } else {
            FetchError::Other(error.to_string())
        }
    }
}

/// Invalid crawl input, rejected before any work is dispatched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
        assert_eq!(
            FetchError::TooLarge(1024).to_string(),
            "page larger than 1024 bytes"
        );
        assert_eq!(
            CrawlError::InvalidConcurrency(0).to_string(),
            "concurrency must be at least 1 (got 0)"
        );
    }
}
