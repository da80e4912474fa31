//! Public API trait for instance `AuthN`.
//!
//! The broker calls this trait for every login and renewal of a workload
//! instance credential.

use async_trait::async_trait;

use crate::error::InstanceAuthnError;
use crate::models::{Auth, ConnectionInfo, LoginRequest};

/// Public API trait for instance `AuthN`.
///
/// ```ignore
/// let auth = client.login(request, connection).await?;
/// assert_eq!(auth.alias.name, auth.alias.metadata.app_id);
/// ```
#[async_trait]
pub trait InstanceAuthnClient: Send + Sync {
    /// Authenticate a workload instance from its identity certificate and a
    /// signature over the request.
    ///
    /// # Errors
    ///
    /// - `Rejected` for missing or invalid fields, an out-of-window signing time,
    ///   failed signature or chain verification, and failed constraint or
    ///   platform cross-checks
    /// - `PermissionDenied` if the role has bound CIDRs and the caller is outside
    ///   them (or no connection information is available)
    /// - `Internal` for storage, configuration and platform failures
    async fn login(
        &self,
        request: LoginRequest,
        connection: Option<ConnectionInfo>,
    ) -> Result<Auth, InstanceAuthnError>;

    /// Re-run the live cross-checks for a previously issued [`Auth`] and return
    /// it with the role's current lifetime parameters.
    ///
    /// # Errors
    ///
    /// - `Rejected` if the identity no longer passes the cross-checks
    /// - `Internal` for corrupted renewal data, missing role or configuration,
    ///   and platform failures
    async fn renew(
        &self,
        auth: Auth,
        connection: Option<ConnectionInfo>,
    ) -> Result<Auth, InstanceAuthnError>;

    /// Return the role name if the role exists.
    ///
    /// # Errors
    ///
    /// - `Rejected` if the name is empty or no such role exists
    /// - `Internal` if the role storage fails
    async fn resolve_role(&self, role: &str) -> Result<String, InstanceAuthnError>;
}
