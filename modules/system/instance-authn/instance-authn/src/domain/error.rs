//! Domain errors for the instance `AuthN` module.

use instance_authn_sdk::{InstanceAuthnError, PlatformError};

use super::repo::StorageError;

/// Internal domain errors.
///
/// `Rejected` and `PermissionDenied` are verdicts on the request; every
/// other variant is a fault of the backend or its dependencies.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Rejected(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    CorruptRenewalData(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("platform error: {0}")]
    Platform(PlatformError),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    #[must_use]
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    #[must_use]
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Rejected(_) | Self::PermissionDenied)
    }
}

impl From<DomainError> for InstanceAuthnError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Rejected(msg) => Self::Rejected(msg),
            DomainError::PermissionDenied => Self::PermissionDenied,
            other => Self::Internal(other.to_string()),
        }
    }
}
