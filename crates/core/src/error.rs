//! Error types for bv-core
//!
//! One backend-agnostic taxonomy shared by every adapter. Adapters translate
//! their native failures into exactly one of these variants at their boundary,
//! keeping the original message for diagnostics.

use thiserror::Error;

/// Result type alias for bv-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested container does not exist
    #[error("No container: {0}")]
    NoContainer(String),

    /// The requested object or directory does not exist
    #[error("No object: {0}")]
    NoObject(String),

    /// Access to the container is disallowed by policy
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Container or object name is malformed or contains unsafe characters
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The backend answered with an error (non-404 status, transport failure)
    #[error("Storage response error: {0}")]
    StorageResponse(String),

    /// The request could not be built or was rejected client-side
    #[error("Client error: {0}")]
    Client(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General storage error
    #[error("{0}")]
    Cloud(String),
}

impl Error {
    /// Whether this error signals an absent resource rather than a failure
    pub const fn is_absent(&self) -> bool {
        matches!(self, Error::NoContainer(_) | Error::NoObject(_))
    }

    /// Whether this error is a genuine backend failure worth logging
    pub const fn is_backend_failure(&self) -> bool {
        matches!(self, Error::StorageResponse(_) | Error::Client(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidName(_) | Error::Config(_) => 2, // UsageError
            Error::StorageResponse(_) | Error::Client(_) => 3, // BackendError
            Error::NotPermitted(_) => 4,                   // NotPermitted
            Error::NoContainer(_) | Error::NoObject(_) => 5, // NotFound
            Error::Cloud(_) => 1,                          // GeneralError
        }
    }
}
