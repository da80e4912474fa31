//! Static platform plugin module.

use std::sync::{Arc, OnceLock};

use instance_authn_sdk::PlatformClientConnector;
use tracing::info;

use crate::config::StaticPlatformPluginConfig;
use crate::domain::{Service, StaticPlatformConnector};

/// Static platform plugin module.
///
/// Builds the record store from configuration and exposes it as a
/// [`PlatformClientConnector`] for the instance `AuthN` module.
pub struct StaticPlatformPlugin {
    service: OnceLock<Arc<Service>>,
}

impl Default for StaticPlatformPlugin {
    fn default() -> Self {
        Self {
            service: OnceLock::new(),
        }
    }
}

impl StaticPlatformPlugin {
    /// # Errors
    /// Returns an error if the plugin was already initialized.
    pub fn init(
        &self,
        cfg: &StaticPlatformPluginConfig,
    ) -> anyhow::Result<Arc<dyn PlatformClientConnector>> {
        info!("Initializing static_platform_plugin");
        tracing::warn!(
            "Static platform plugin answers from configuration; \
             instance liveness is not checked against a real platform."
        );

        let service = Arc::new(Service::from_config(cfg));
        let (apps, orgs, spaces) = service.counts();
        info!(apps, orgs, spaces, "Loaded plugin configuration");

        self.service
            .set(service.clone())
            .map_err(|_| anyhow::anyhow!("Service already initialized"))?;

        Ok(Arc::new(StaticPlatformConnector::new(service)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn init_twice_fails() {
        let plugin = StaticPlatformPlugin::default();
        assert!(plugin.init(&StaticPlatformPluginConfig::default()).is_ok());
        assert!(plugin.init(&StaticPlatformPluginConfig::default()).is_err());
    }
}
