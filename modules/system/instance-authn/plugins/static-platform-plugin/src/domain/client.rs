//! Client implementation for the static platform plugin.
//!
//! Implements `PlatformClient` using the domain service, and a connector
//! that always hands out the same service.

use std::sync::Arc;

use async_trait::async_trait;
use instance_authn_sdk::{
    PlatformApp, PlatformClient, PlatformClientConnector, PlatformError, PlatformOrg,
    PlatformSettings, PlatformSpace,
};

use super::service::Service;

#[async_trait]
impl PlatformClient for Service {
    async fn app_by_guid(&self, guid: &str) -> Result<PlatformApp, PlatformError> {
        self.app(guid)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("app", guid))
    }

    async fn org_by_guid(&self, guid: &str) -> Result<PlatformOrg, PlatformError> {
        self.org(guid)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("organization", guid))
    }

    async fn space_by_guid(&self, guid: &str) -> Result<PlatformSpace, PlatformError> {
        self.space(guid)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("space", guid))
    }
}

/// Connector ignoring the connection settings.
pub struct StaticPlatformConnector {
    service: Arc<Service>,
}

impl StaticPlatformConnector {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PlatformClientConnector for StaticPlatformConnector {
    async fn connect(
        &self,
        settings: &PlatformSettings,
    ) -> Result<Arc<dyn PlatformClient>, PlatformError> {
        tracing::debug!(api_addr = %settings.api_addr, "serving static platform records");
        Ok(self.service.clone())
    }
}
