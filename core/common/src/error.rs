//! Common error types for ODK Services.

use thiserror::Error;

/// Top-level error type for ODK Services operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The sync service is not bound and the retry budget ran out.
    #[error("Sync service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A remote call raced a disconnect of the sync service.
    #[error("Sync service disconnected: {0}")]
    ServiceDisconnected(String),

    /// The sync service rejected or failed a call.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Server settings are missing or incomplete.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// A sync status name outside the known set.
    #[error("Unknown sync status: {0}")]
    UnknownStatus(String),

    /// Operation attempted in a state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the failure means "try again once the service is reachable".
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ServiceDisconnected(_) | Error::Io(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(Error::ServiceDisconnected("gone".to_string()).is_transient());
        assert!(!Error::Remote("boom".to_string()).is_transient());
        assert!(!Error::UnknownStatus("BOGUS".to_string()).is_transient());
    }
}
