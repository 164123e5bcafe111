//! Event: the unit pushed through every stream.
//!
//! There is no completion case: a stream keeps accepting values and errors
//! until whoever holds its disposable tears it down.

use std::sync::Arc;

use crate::error::{Result, StreamError};

/// A single push: either a value or a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T> {
    Value(T),
    Error(StreamError),
}

/// Callback type for stream subscribers.
///
/// Handlers run synchronously on whichever context pushed the event.
pub type Handler<T> = Arc<dyn Fn(&Event<T>) + Send + Sync>;

impl<T> Event<T> {
    /// The value, if this is a value event.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Error(_) => None,
        }
    }

    /// The error, if this is an error event.
    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Self::Value(_) => None,
            Self::Error(e) => Some(e),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Transform the value, passing errors through unchanged.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Event<U> {
        match self {
            Self::Value(v) => Event::Value(f(v)),
            Self::Error(e) => Event::Error(e.clone()),
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Error(e) => Err(e),
        }
    }
}

impl<T> From<Result<T>> for Event<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(v) => Self::Value(v),
            Err(e) => Self::Error(e),
        }
    }
}
