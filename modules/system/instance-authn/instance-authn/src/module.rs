//! Instance `AuthN` module.

use std::sync::{Arc, OnceLock};

use instance_authn_sdk::{InstanceAuthnClient, PlatformClientConnector};
use tracing::info;

use crate::config::InstanceAuthnModuleConfig;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::{InstanceAuthnLocalClient, Service};
use crate::infra::storage::InMemoryStorage;
use crate::infra::x509::X509Verifier;

/// Instance `AuthN` module.
///
/// This module:
/// 1. Seeds in-memory role and backend configuration storage
/// 2. Wires the X.509 verifier and the platform connector supplied by the host
/// 3. Hands out the local [`InstanceAuthnClient`]
pub struct InstanceAuthn {
    service: OnceLock<Arc<Service>>,
}

impl Default for InstanceAuthn {
    fn default() -> Self {
        Self {
            service: OnceLock::new(),
        }
    }
}

impl InstanceAuthn {
    /// Initializes the module with the wall clock.
    ///
    /// # Errors
    /// Returns an error if the module was already initialized.
    pub fn init(
        &self,
        cfg: &InstanceAuthnModuleConfig,
        connector: Arc<dyn PlatformClientConnector>,
    ) -> anyhow::Result<Arc<dyn InstanceAuthnClient>> {
        self.init_with_clock(cfg, connector, Arc::new(SystemClock))
    }

    /// Initializes the module with an explicit time source.
    ///
    /// # Errors
    /// Returns an error if the module was already initialized.
    #[tracing::instrument(skip_all, fields(roles = cfg.roles.len()))]
    pub fn init_with_clock(
        &self,
        cfg: &InstanceAuthnModuleConfig,
        connector: Arc<dyn PlatformClientConnector>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Arc<dyn InstanceAuthnClient>> {
        info!(
            roles = cfg.roles.len(),
            configured = cfg.backend.is_some(),
            "Initializing instance_authn"
        );
        if let Some(backend) = &cfg.backend
            && let Err(reason) = backend.validate()
        {
            tracing::warn!(%reason, "backend configuration is incomplete; logins will fail");
        }

        let storage = Arc::new(InMemoryStorage::from_config(cfg));
        let svc = Arc::new(Service::new(
            storage.clone(),
            storage,
            Arc::new(X509Verifier::new()),
            connector,
            clock,
        ));

        self.service
            .set(svc.clone())
            .map_err(|_| anyhow::anyhow!("Service already initialized"))?;

        Ok(Arc::new(InstanceAuthnLocalClient::new(svc)))
    }

    /// The initialized service, for administrative operations such as
    /// configuration writes.
    #[must_use]
    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.get().cloned()
    }
}
