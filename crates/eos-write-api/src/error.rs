//! Error types for the write API.
//!
//! Every failure surfaces as a [`WriteApiError`]. Errors raised before a
//! transaction future exists (bad arguments, missing configuration, malformed
//! requests) come back from the call itself; errors after the first
//! asynchronous boundary (network, signer) come back from the future.

use std::fmt;
use thiserror::Error;

/// A specialized Result type for write API operations.
pub type WriteApiResult<T> = Result<T, WriteApiError>;

/// The error taxonomy of the transaction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong arity or wrong argument type.
    Argument,
    /// Missing signer, missing chain id, callback used where forbidden.
    Configuration,
    /// Malformed scope, messages or authorization.
    Validation,
    /// Context fetch or submission failure.
    Network,
    /// Signer rejection or malformed signature shape.
    Signing,
    /// Serialization and everything else.
    Internal,
}

/// The main error type for the write API.
#[derive(Error, Debug)]
pub enum WriteApiError {
    /// Wrong argument count or argument type for an action call
    #[error("Argument error: {0}")]
    Argument(String),

    /// Misuse of the configured pipeline
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed transaction request
    #[error("Validation error: {0}")]
    Validation(String),

    /// An action was called without arguments; carries the usage text
    #[error("{0}")]
    Usage(String),

    /// The action type is not known to the schema registry
    #[error("Unknown type: {0}")]
    UnknownAction(String),

    /// Transaction submission failed
    #[error("Network error: {message}")]
    Network {
        /// Failure message reported by the network collaborator
        message: String,
        /// Hex SHA-256 digest of the canonical transaction bytes
        digest: Option<String>,
    },

    /// Error occurred during HTTP communication
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The chain API returned an error response
    #[error("API error ({status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error body returned by the API
        message: String,
    },

    /// The sign provider rejected or returned a malformed signature
    #[error("Signing error: {0}")]
    Signing(String),

    /// Error occurred during BCS serialization/deserialization
    #[error("Codec error: {0}")]
    Codec(String),

    /// Error occurred during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error occurred during hex encoding/decoding
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Invalid account name
    #[error("Invalid account name: {0}")]
    InvalidName(String),

    /// Invalid asset or symbol
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A member of an atomic batch failed
    #[error("Batch failed: {0}")]
    Batch(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Maximum length for error messages to prevent excessive memory usage in logs.
const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Patterns that might indicate sensitive information in error messages.
const SENSITIVE_PATTERNS: &[&str] = &["private_key", "secret", "password", "wif"];

impl WriteApiError {
    /// Creates a new argument error
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        Self::Argument(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new signing error
    pub fn signing<S: Into<String>>(msg: S) -> Self {
        Self::Signing(msg.into())
    }

    /// Creates a new codec error
    pub fn codec<E: fmt::Display>(err: E) -> Self {
        Self::Codec(err.to_string())
    }

    /// Creates a new API error from response details
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns where this error sits in the pipeline's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument(_)
            | Self::Usage(_)
            | Self::UnknownAction(_)
            | Self::InvalidName(_)
            | Self::InvalidAsset(_) => ErrorKind::Argument,
            Self::Config(_) | Self::InvalidPrivateKey(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network { .. } | Self::Http(_) | Self::Api { .. } => ErrorKind::Network,
            Self::Signing(_) => ErrorKind::Signing,
            Self::Codec(_)
            | Self::Json(_)
            | Self::Hex(_)
            | Self::Batch(_)
            | Self::Internal(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns the canonical byte digest attached to a failed submission.
    pub fn digest(&self) -> Option<&str> {
        match self {
            Self::Network { digest, .. } => digest.as_deref(),
            _ => None,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status_code, .. } => {
                matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Returns a sanitized version of the error message safe for logging.
    ///
    /// Control characters are stripped, long messages truncated, and messages
    /// that look like they carry key material are redacted.
    pub fn sanitized_message(&self) -> String {
        sanitize(&self.to_string())
    }
}

fn sanitize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let lower = cleaned.to_lowercase();
    for pattern in SENSITIVE_PATTERNS {
        if lower.contains(pattern) {
            return format!("[REDACTED: message contained sensitive pattern '{pattern}']");
        }
    }

    if cleaned.len() > MAX_ERROR_MESSAGE_LENGTH {
        let mut end = MAX_ERROR_MESSAGE_LENGTH;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, total length: {}]",
            &cleaned[..end],
            cleaned.len()
        )
    } else {
        cleaned
    }
}
