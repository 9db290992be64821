//! Context helpers for attaching a message to lower-level errors.

use super::{BagzError, Result};

/// Attach context to a fallible result.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed message.
    ///
    /// # Errors
    ///
    /// Returns `BagzError::WithContext` if `self` is an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error with a lazily built message.
    ///
    /// # Errors
    ///
    /// Returns `BagzError::WithContext` if `self` is an error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| BagzError::WithContext {
            context: context.into(),
            source: Box::new(source),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| BagzError::WithContext {
            context: f().into(),
            source: Box::new(source),
        })
    }
}

/// Turn a missing value into an error.
pub trait OptionExt<T> {
    /// # Errors
    ///
    /// Returns `err()` if `self` is `None`.
    fn ok_or_bagz<F>(self, err: F) -> Result<T>
    where
        F: FnOnce() -> BagzError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_bagz<F>(self, err: F) -> Result<T>
    where
        F: FnOnce() -> BagzError,
    {
        self.ok_or_else(err)
    }
}
