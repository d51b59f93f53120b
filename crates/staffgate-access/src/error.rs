//! Errors raised by the collaborators the access core reads from.

use thiserror::Error;

/// Failure reading principals or facilities from their backing stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("principal directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("facility registry unavailable: {0}")]
    RegistryUnavailable(String),
}
