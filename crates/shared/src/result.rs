//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for lifting typed errors into the envelope.
pub trait ResultExt<T, E> {
    /// Convert the error into an `ErrorEnvelope`.
    fn into_envelope(self) -> Result<T>
    where
        E: Into<ErrorEnvelope>;

    /// Convert the error into an `ErrorEnvelope` and attach one metadata entry.
    fn with_envelope_metadata(self, key: &str, value: &str) -> Result<T>
    where
        E: Into<ErrorEnvelope>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn into_envelope(self) -> Result<T>
    where
        E: Into<ErrorEnvelope>,
    {
        self.map_err(Into::into)
    }

    fn with_envelope_metadata(self, key: &str, value: &str) -> Result<T>
    where
        E: Into<ErrorEnvelope>,
    {
        self.map_err(|error| error.into().with_metadata(key, value))
    }
}
