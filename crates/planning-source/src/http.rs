//! Fetches the planning page over HTTP(S).

use reqwest::{Client, Response};
use tracing::{debug, trace, warn};

use crate::config::HttpSourceConfig;
use crate::error::{SourceError, SourceResult};
use crate::source::{BoxFuture, ScheduleSource};

/// [`ScheduleSource`] backed by an HTTP GET with timeout and retry.
pub struct HttpSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    /// Creates a source from `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: HttpSourceConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                SourceError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    /// Fetches the page, retrying transient failures per the retry policy.
    pub async fn fetch(&self) -> SourceResult<String> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_once().await {
                Ok(body) => {
                    debug!(
                        url = %self.config.url,
                        attempt,
                        bytes = body.len(),
                        "Fetched planning page"
                    );
                    return Ok(body);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.retry.backoff_delay(attempt);
                    warn!(
                        url = %self.config.url,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self) -> SourceResult<String> {
        let url = self.config.url.as_str();
        trace!(url = %url, "Sending request");

        let response = self
            .client
            .get(self.config.url.clone())
            .send()
            .await
            .map_err(|e| request_error(e).with_url(url))?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> SourceResult<String> {
        let url = self.config.url.as_str();
        let status = response.status();
        trace!(status = %status, "Received response");

        if status.is_success() {
            return response.text().await.map_err(|e| {
                if e.is_timeout() {
                    request_error(e).with_url(url)
                } else {
                    SourceError::invalid_body(format!("failed to read response: {}", e))
                        .with_url(url)
                        .with_source(e)
                }
            });
        }

        let message = format!("unexpected status {}", status);
        let error = if status.is_server_error() {
            SourceError::server(message)
        } else {
            SourceError::upstream_status(message)
        };
        Err(error.with_url(url))
    }
}

impl ScheduleSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_html(&self) -> BoxFuture<'_, SourceResult<String>> {
        Box::pin(self.fetch())
    }
}

fn request_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::timeout(format!("request timed out: {}", e)).with_source(e)
    } else {
        SourceError::network(format!("request failed: {}", e)).with_source(e)
    }
}
