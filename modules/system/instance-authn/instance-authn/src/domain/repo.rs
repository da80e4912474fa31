//! Storage seams for roles and the backend configuration.

use async_trait::async_trait;

use super::role::RoleEntry;
use crate::config::InstanceAuthnConfig;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StorageError(pub String);

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns `None` when no role with this name exists.
    async fn get_role(&self, name: &str) -> Result<Option<RoleEntry>, StorageError>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn get_config(&self) -> Result<Option<InstanceAuthnConfig>, StorageError>;

    async fn put_config(&self, config: InstanceAuthnConfig) -> Result<(), StorageError>;
}
