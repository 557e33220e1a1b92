//! HTTP source configuration.

use std::time::Duration;
use url::Url;

/// The clinic's published planning page.
pub const DEFAULT_PLANNING_URL: &str =
    "https://intranet.radiologie-lyon.com/fichiers/document/2577_planning_medecins.htm";

/// Exponential backoff between fetch attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Builder: set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.multiplier = multiplier;
        self
    }

    /// Delay before the attempt following `failed_attempts` consecutive failures.
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        if failed_attempts == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let delay = base * self.multiplier.powi(failed_attempts as i32 - 1);
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Configuration for [`crate::HttpSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub url: Url,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl HttpSourceConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url.as_ref())?,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("planning-ics/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        })
    }

    /// Configuration for the clinic's planning page.
    pub fn clinic() -> Result<Self, url::ParseError> {
        Self::new(DEFAULT_PLANNING_URL)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
