//! The [`ScheduleSource`] seam between the pipeline and wherever the planning
//! HTML comes from.

use std::future::Future;
use std::pin::Pin;

use crate::error::{SourceError, SourceErrorCode, SourceResult};

/// A boxed future, keeping [`ScheduleSource`] object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies the raw planning HTML.
///
/// Every call fetches a fresh copy; implementations do not cache.
pub trait ScheduleSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetches the full planning page.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the page cannot be obtained.
    fn fetch_html(&self) -> BoxFuture<'_, SourceResult<String>>;
}

/// A source that always returns the same HTML.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    html: String,
}

impl StaticSource {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            name: "static".to_string(),
            html: html.into(),
        }
    }

    /// Builder: set the name reported in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScheduleSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_html(&self) -> BoxFuture<'_, SourceResult<String>> {
        let html = self.html.clone();
        Box::pin(async move { Ok(html) })
    }
}

/// A source that always fails.
#[derive(Debug, Clone)]
pub struct FailingSource {
    name: String,
    code: SourceErrorCode,
    message: String,
}

impl FailingSource {
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            name: "failing".to_string(),
            code,
            message: message.into(),
        }
    }
}

impl ScheduleSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_html(&self) -> BoxFuture<'_, SourceResult<String>> {
        let error = SourceError::new(self.code, self.message.clone());
        Box::pin(async move { Err(error) })
    }
}
