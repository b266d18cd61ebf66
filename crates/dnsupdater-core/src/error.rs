//! Error types for dnsupdater
//!
//! This module defines all error types used throughout the crate.
//!
//! Errors fall into two classes for reporting purposes:
//! - **Transient**: network failures, provider faults, throttling. The next
//!   poll cycle is likely to succeed.
//! - **Persistent**: the provider rejected the request itself (bad
//!   credentials, unknown domain) or the IP source returned unusable data.
//!   These recur every cycle until someone fixes the configuration.
//!
//! Both classes share one recovery path (log and wait for the next cycle).

use std::fmt;
use thiserror::Error;

/// Result type alias for dnsupdater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsupdater
#[derive(Error, Debug)]
pub enum Error {
    /// IP source unreachable, timed out, or answered with a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Request rejected by the provider as malformed or unauthorized
    #[error("Provider rejected request ({code}): {message}")]
    ProviderClient {
        /// Provider error code (e.g. "InvalidAccessKeyId.NotFound")
        code: String,
        /// Human readable message from the provider
        message: String,
    },

    /// Provider-side fault, throttling, or an unusable provider response
    #[error("Provider fault ({code}): {message}")]
    ProviderServer {
        /// Provider error code (e.g. "ServiceUnavailable")
        code: String,
        /// Human readable message from the provider
        message: String,
    },

    /// Invalid input (e.g. resolved IP failed validation)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider client-side error
    pub fn provider_client(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderClient {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a provider server-side error
    pub fn provider_server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderServer {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::ProviderClient { .. } => ErrorKind::ProviderClient,
            Error::ProviderServer { .. } => ErrorKind::ProviderServer,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this error will keep happening until configuration changes
    pub fn is_persistent(&self) -> bool {
        self.kind().is_persistent()
    }
}

/// Coarse error classification used in logs and scheduler events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    ProviderClient,
    ProviderServer,
    InvalidInput,
    Config,
}

impl ErrorKind {
    /// Stable name for structured logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::ProviderClient => "provider_client",
            ErrorKind::ProviderServer => "provider_server",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Config => "config",
        }
    }

    /// Whether errors of this kind recur until configuration is fixed
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            ErrorKind::ProviderClient | ErrorKind::InvalidInput | ErrorKind::Config
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
