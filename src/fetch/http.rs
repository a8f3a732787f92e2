// src/fetch/http.rs
// =============================================================================
// Downloads a single web page.
//
// The crawl never talks to reqwest directly; it goes through the PageFetcher
// trait. That keeps the workers testable (tests plug in a fake fetcher that
// serves canned HTML) and keeps all HTTP details in this file.
//
// Rust concepts:
// - Traits: PageFetcher is the "fetch a page" capability
// - async-trait: lets a trait have async methods and still be used as
//   Arc<dyn PageFetcher>
// - Send + Sync: the fetcher is shared by every worker task
// =============================================================================

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

use crate::error::FetchError;

/// Something that can download a page and hand back its HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher. One instance (one connection pool) per crawl.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Pages larger than `max_body_bytes` fail with FetchError::TooLarge.
    pub fn new(max_body_bytes: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

// Appends one body chunk, refusing to grow past `limit` bytes
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), FetchError> {
    if body.len() + chunk.len() > limit {
        return Err(FetchError::TooLarge(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        trace!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Cheap early exit when the server announces the size
        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                return Err(FetchError::TooLarge(self.max_body_bytes));
            }
        }

        // Read chunk by chunk so a lying or missing Content-Length can't
        // make us buffer more than the limit
        let mut response = response;
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut body, &chunk, self.max_body_bytes)?;
        }

        // Script tags are ASCII, a lossy decode of odd charsets is fine here
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
