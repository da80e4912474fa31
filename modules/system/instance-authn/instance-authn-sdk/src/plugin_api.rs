//! Plugin API traits for platform backends.
//!
//! A platform plugin corroborates the identity claimed by an instance
//! certificate. The backend never takes identity from the platform, only
//! confirmation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::platform::{PlatformApp, PlatformOrg, PlatformSettings, PlatformSpace};

/// Read access to the platform control-plane API.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// # Errors
    ///
    /// - `NotFound` if the application does not exist
    /// - any other variant if the lookup could not be completed
    async fn app_by_guid(&self, guid: &str) -> Result<PlatformApp, PlatformError>;

    /// # Errors
    ///
    /// - `NotFound` if the organization does not exist
    /// - any other variant if the lookup could not be completed
    async fn org_by_guid(&self, guid: &str) -> Result<PlatformOrg, PlatformError>;

    /// # Errors
    ///
    /// - `NotFound` if the space does not exist
    /// - any other variant if the lookup could not be completed
    async fn space_by_guid(&self, guid: &str) -> Result<PlatformSpace, PlatformError>;
}

/// Builds authenticated [`PlatformClient`]s.
///
/// The backend caches the returned client and asks for a new one only after
/// the cached one was tainted or the configuration changed.
#[async_trait]
pub trait PlatformClientConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the settings are unusable or the platform refuses
    /// to authenticate.
    async fn connect(
        &self,
        settings: &PlatformSettings,
    ) -> Result<Arc<dyn PlatformClient>, PlatformError>;
}
