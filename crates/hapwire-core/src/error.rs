//! Unified error handling for hapwire.
//!
//! This module provides a common error type shared by the bridge and CLI
//! crates, reducing boilerplate and keeping error handling consistent.

/// Unified error type for hapwire.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport errors (connection, DNS, timeout, bad status).
    #[error("Network error: {0}")]
    Network(String),

    /// Write-template rendering errors (unresolved placeholder etc.).
    #[error("Template error: {0}")]
    Template(String),

    /// Catalog lookup errors.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found errors.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

/// Convenience macros for creating errors.
#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        $crate::error::Error::Config($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! network_err {
    ($msg:expr) => {
        $crate::error::Error::Network($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Network(format!($fmt, $($arg)*))
    };
}

// Error conversion helpers
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

// Convenience constructors for common errors
impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
