use thiserror::Error;

// ---------------------------------------------------------------------------
// StreamError
// ---------------------------------------------------------------------------

/// The failure carried by [`Event::Error`](crate::event::Event::Error).
///
/// Events are multicast, so every variant is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Remote observer failed ({code}): {message}")]
    Remote { code: String, message: String },

    #[error("Mapping failed: {0}")]
    Mapping(String),

    #[error("Source disconnected")]
    Disconnected,
}

impl StreamError {
    /// Shorthand for a [`StreamError::Remote`] failure.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Mapping(e.to_string())
    }
}

/// Convenience alias; the default error type is `StreamError`.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// soft_assert!
// ---------------------------------------------------------------------------

/// Asserts in debug builds; logs and carries on in release builds.
///
/// Used for construction-time invariants whose violation is a programming
/// error the release build should survive.
macro_rules! soft_assert {
    ($cond:expr, $($arg:tt)+) => {{
        let ok: bool = $cond;
        debug_assert!(ok, $($arg)+);
        if !ok {
            ::tracing::warn!(invariant = stringify!($cond), $($arg)+);
        }
    }};
}
pub(crate) use soft_assert;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
