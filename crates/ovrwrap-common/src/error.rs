//! Common error types for ovrwrap.

use thiserror::Error;

/// Result type alias using ovrwrap's common error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the translation core: settings, library loading.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (settings file, library probing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No candidate path produced a loadable runtime library
    #[error("runtime library not found: {0}")]
    LibraryNotFound(String),

    /// The runtime library is missing an export we need
    #[error("missing runtime symbol: {0}")]
    MissingSymbol(String),
}

impl Error {
    /// Create a serialization error from any displayable type.
    pub fn serialization(msg: impl std::fmt::Display) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Create a config error from any displayable type.
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create a library-not-found error from any displayable type.
    pub fn library_not_found(msg: impl std::fmt::Display) -> Self {
        Self::LibraryNotFound(msg.to_string())
    }

    /// Create a missing-symbol error from any displayable type.
    pub fn missing_symbol(msg: impl std::fmt::Display) -> Self {
        Self::MissingSymbol(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}
