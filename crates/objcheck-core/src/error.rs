//! Error taxonomy for the validation pipeline.
//!
//! Configuration errors are fatal and raised before any network activity.
//! Validation failures (length or digest mismatch) are reported per object
//! and never abort an enclosing batch or suite.

use crate::digest::Digest;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported digest algorithm: '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },

    #[error("invalid target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("config: {0}")]
    Config(String),

    #[error("unable to determine content-length of {uri}: {reason}")]
    Metadata { uri: String, reason: String },

    #[error("expected to read {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("expected to write {expected} bytes, got {actual}")]
    ShortWrite { expected: u64, actual: u64 },

    #[error("transfer aborted after {transferred} bytes: {source}")]
    Transfer {
        transferred: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("content-length mismatch: expected: {expected}, actual: {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("digest mismatch: expected: {expected}, actual: {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("unable to delete {uri}: {source}")]
    Delete {
        uri: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{operation} returned HTTP {status}")]
    Http { operation: &'static str, status: u32 },

    #[error("curl: {0}")]
    Curl(#[from] curl::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

impl Error {
    /// True for errors that must abort before any network call is made.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedAlgorithm(_)
                | Error::InvalidSize { .. }
                | Error::InvalidTarget { .. }
                | Error::Config(_)
        )
    }

    /// True for semantic mismatches between what was written and what was read back.
    pub fn is_validation_failure(&self) -> bool {
        match self {
            Error::LengthMismatch { .. } | Error::DigestMismatch { .. } => true,
            Error::Transfer { source, .. } => source.is_validation_failure(),
            _ => false,
        }
    }

    /// Bytes moved before a transfer failed, if this error came from one.
    pub fn transferred(&self) -> Option<u64> {
        match self {
            Error::Transfer { transferred, .. } => Some(*transferred),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<xdg::BaseDirectoriesError> for Error {
    fn from(e: xdg::BaseDirectoriesError) -> Self {
        Error::Config(e.to_string())
    }
}
