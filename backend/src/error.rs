//! Error types for the version endpoint.

use thiserror::Error;

/// Errors raised while constructing a version endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A failed attempt to resolve the application version.
///
/// Cloned out of the memoization cell for every requester once recorded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0}")]
    Failed(String),
    #[error("Version resolver panicked: {0}")]
    Panicked(String),
}

impl ResolveError {
    pub(crate) fn from_anyhow(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the context chain on one line.
        Self::Failed(format!("{:#}", err))
    }
}
