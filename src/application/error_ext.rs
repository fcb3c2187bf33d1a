//! Error conversion helpers for collaborator calls
//!
//! Provides extension traits for cleaner error handling with model context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add model context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fetcher.fetch(&query)
    ///     .with_model_context("fetch rows", &query.model)?;
    /// ```
    fn with_model_context(self, action: &str, model: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_model_context(self, action: &str, model: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, model),
            source: Box::new(e),
        })
    }
}
