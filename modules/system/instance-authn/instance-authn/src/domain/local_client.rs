//! Local (in-process) client for the instance `AuthN` module.

use std::sync::Arc;

use async_trait::async_trait;
use instance_authn_sdk::{Auth, ConnectionInfo, InstanceAuthnClient, InstanceAuthnError, LoginRequest};

use super::{DomainError, Service};

/// Local client wrapping the service.
///
/// Handed out by [`crate::InstanceAuthn::init`].
pub struct InstanceAuthnLocalClient {
    svc: Arc<Service>,
}

impl InstanceAuthnLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> InstanceAuthnError {
    if e.is_fault() {
        tracing::error!(operation = op, error = ?e, "instance_authn call failed");
    } else {
        tracing::debug!(operation = op, error = %e, "instance_authn request rejected");
    }
    e.into()
}

#[async_trait]
impl InstanceAuthnClient for InstanceAuthnLocalClient {
    async fn login(
        &self,
        request: LoginRequest,
        connection: Option<ConnectionInfo>,
    ) -> Result<Auth, InstanceAuthnError> {
        self.svc
            .login(&request, connection.as_ref())
            .await
            .map_err(|e| log_and_convert("login", e))
    }

    async fn renew(
        &self,
        auth: Auth,
        connection: Option<ConnectionInfo>,
    ) -> Result<Auth, InstanceAuthnError> {
        self.svc
            .renew(auth, connection.as_ref())
            .await
            .map_err(|e| log_and_convert("renew", e))
    }

    async fn resolve_role(&self, role: &str) -> Result<String, InstanceAuthnError> {
        self.svc
            .resolve_role(role)
            .await
            .map_err(|e| log_and_convert("resolve_role", e))
    }
}
