//! Error types for the instance `AuthN` module.

use thiserror::Error;

/// Errors that can occur when using the instance `AuthN` API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceAuthnError {
    /// The request was refused; the message is safe to show to the caller.
    #[error("{0}")]
    Rejected(String),

    /// The caller's network origin is not allowed by the role.
    #[error("permission denied")]
    PermissionDenied,

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl InstanceAuthnError {
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::PermissionDenied)
    }
}

/// Errors returned by platform plugins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The platform has no record with this GUID.
    #[error("{kind} {guid} not found")]
    NotFound { kind: &'static str, guid: String },

    /// The platform refused the configured credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The platform could not be reached or answered with an error status.
    #[error("platform request failed: {0}")]
    Transport(String),

    /// The platform answered with a body that could not be understood.
    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    /// The connection settings are unusable.
    #[error("invalid platform settings: {0}")]
    InvalidSettings(String),
}

impl PlatformError {
    #[must_use]
    pub fn not_found(kind: &'static str, guid: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            guid: guid.into(),
        }
    }
}
