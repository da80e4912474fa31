use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::{InstanceAuthnConfig, InstanceAuthnModuleConfig};
use crate::domain::repo::{ConfigRepository, RoleRepository, StorageError};
use crate::domain::role::RoleEntry;

/// Process-local role and configuration storage.
#[derive(Default)]
pub struct InMemoryStorage {
    roles: RwLock<HashMap<String, RoleEntry>>,
    config: RwLock<Option<InstanceAuthnConfig>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds roles and the backend configuration from module configuration.
    #[must_use]
    pub fn from_config(cfg: &InstanceAuthnModuleConfig) -> Self {
        Self {
            roles: RwLock::new(
                cfg.roles
                    .iter()
                    .map(|(name, role)| (name.clone(), role.clone()))
                    .collect(),
            ),
            config: RwLock::new(cfg.backend.clone()),
        }
    }

    /// Creates or replaces a role.
    pub fn put_role(&self, name: impl Into<String>, role: RoleEntry) {
        self.roles.write().insert(name.into(), role);
    }

    /// Returns `true` if the role existed.
    #[must_use]
    pub fn delete_role(&self, name: &str) -> bool {
        self.roles.write().remove(name).is_some()
    }

    /// Replaces or removes the backend configuration without going through
    /// the service.
    pub fn set_config(&self, config: Option<InstanceAuthnConfig>) {
        *self.config.write() = config;
    }

    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roles.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl RoleRepository for InMemoryStorage {
    async fn get_role(&self, name: &str) -> Result<Option<RoleEntry>, StorageError> {
        Ok(self.roles.read().get(name).cloned())
    }
}

#[async_trait]
impl ConfigRepository for InMemoryStorage {
    async fn get_config(&self) -> Result<Option<InstanceAuthnConfig>, StorageError> {
        Ok(self.config.read().clone())
    }

    async fn put_config(&self, config: InstanceAuthnConfig) -> Result<(), StorageError> {
        *self.config.write() = Some(config);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_from_module_config() {
        let mut cfg = InstanceAuthnModuleConfig::default();
        cfg.roles.insert("web".to_owned(), RoleEntry::default());
        cfg.backend = Some(InstanceAuthnConfig {
            cf_api_addr: "https://api.example.com".to_owned(),
            ..InstanceAuthnConfig::default()
        });

        let storage = InMemoryStorage::from_config(&cfg);
        assert!(storage.get_role("web").await.unwrap().is_some());
        assert!(storage.get_role("db").await.unwrap().is_none());
        assert_eq!(
            storage.get_config().await.unwrap().unwrap().cf_api_addr,
            "https://api.example.com"
        );
    }

    #[tokio::test]
    async fn role_crud() {
        let storage = InMemoryStorage::new();
        storage.put_role("b", RoleEntry::default());
        storage.put_role("a", RoleEntry::default());
        assert_eq!(storage.role_names(), vec!["a", "b"]);

        assert!(storage.delete_role("a"));
        assert!(!storage.delete_role("a"));
        assert!(storage.get_role("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn config_put_replaces_previous() {
        let storage = InMemoryStorage::new();
        assert!(storage.get_config().await.unwrap().is_none());

        let mut config = InstanceAuthnConfig::default();
        storage.put_config(config.clone()).await.unwrap();
        config.cf_timeout_secs = 9;
        storage.put_config(config).await.unwrap();

        assert_eq!(storage.get_config().await.unwrap().unwrap().cf_timeout_secs, 9);
    }
}
