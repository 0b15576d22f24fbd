//! Backend error types.

use thiserror::Error;

use crate::Capabilities;

/// Backend error type.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Two descriptors registered under the same id.
    #[error("a backend with id '{0}' is already registered")]
    DuplicateId(String),

    /// Finalize was called before every requested capability was supplied.
    #[error("backend '{id}' was not given its required inputs: {missing:?}")]
    MissingCapability { id: String, missing: Capabilities },

    /// The constructor returned an error or panicked.
    #[error("{0}")]
    Fault(String),

    /// The constructor succeeded but the backend is not ready to tick.
    #[error("backend '{0}' is not ready after initialisation")]
    NotReady(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
