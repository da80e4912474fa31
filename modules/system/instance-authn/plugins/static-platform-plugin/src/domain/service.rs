//! Service implementation for the static platform plugin.

use std::collections::HashMap;

use instance_authn_sdk::{PlatformApp, PlatformOrg, PlatformSpace};

use crate::config::StaticPlatformPluginConfig;

/// Static platform record store.
///
/// Later records with a duplicate GUID replace earlier ones.
pub struct Service {
    apps: HashMap<String, PlatformApp>,
    orgs: HashMap<String, PlatformOrg>,
    spaces: HashMap<String, PlatformSpace>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticPlatformPluginConfig) -> Self {
        let apps = cfg
            .apps
            .iter()
            .map(|a| {
                (
                    a.guid.clone(),
                    PlatformApp {
                        guid: a.guid.clone(),
                        name: a.name.clone(),
                        space_guid: a.space_guid.clone(),
                        instances: a.instances,
                    },
                )
            })
            .collect();
        let orgs = cfg
            .orgs
            .iter()
            .map(|o| {
                (
                    o.guid.clone(),
                    PlatformOrg {
                        guid: o.guid.clone(),
                        name: o.name.clone(),
                    },
                )
            })
            .collect();
        let spaces = cfg
            .spaces
            .iter()
            .map(|s| {
                (
                    s.guid.clone(),
                    PlatformSpace {
                        guid: s.guid.clone(),
                        name: s.name.clone(),
                        organization_guid: s.organization_guid.clone(),
                    },
                )
            })
            .collect();

        Self { apps, orgs, spaces }
    }

    #[must_use]
    pub fn app(&self, guid: &str) -> Option<&PlatformApp> {
        self.apps.get(guid)
    }

    #[must_use]
    pub fn org(&self, guid: &str) -> Option<&PlatformOrg> {
        self.orgs.get(guid)
    }

    #[must_use]
    pub fn space(&self, guid: &str) -> Option<&PlatformSpace> {
        self.spaces.get(guid)
    }

    /// Number of (apps, orgs, spaces) served.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.apps.len(), self.orgs.len(), self.spaces.len())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn config() -> StaticPlatformPluginConfig {
        serde_json::from_value(serde_json::json!({
            "apps": [
                { "guid": "app-1", "name": "first", "space_guid": "space-1" },
                { "guid": "app-1", "name": "second", "space_guid": "space-1", "instances": 3 }
            ],
            "orgs": [{ "guid": "org-1", "name": "my-org" }],
            "spaces": [{ "guid": "space-1", "name": "my-space", "organization_guid": "org-1" }]
        }))
        .unwrap()
    }

    #[test]
    fn later_records_replace_earlier_ones() {
        let service = Service::from_config(&config());
        let app = service.app("app-1").unwrap();
        assert_eq!(app.name, "second");
        assert_eq!(app.instances, 3);
        assert_eq!(service.counts(), (1, 1, 1));
    }

    #[test]
    fn instances_default_to_one() {
        let cfg: StaticPlatformPluginConfig = serde_json::from_value(serde_json::json!({
            "apps": [{ "guid": "a", "name": "n", "space_guid": "s" }]
        }))
        .unwrap();
        assert_eq!(Service::from_config(&cfg).app("a").unwrap().instances, 1);
    }

    #[test]
    fn unknown_guids_are_absent() {
        let service = Service::from_config(&config());
        assert!(service.app("app-2").is_none());
        assert!(service.org("org-2").is_none());
        assert_eq!(service.space("space-1").unwrap().organization_guid, "org-1");
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let result: Result<StaticPlatformPluginConfig, _> =
            serde_json::from_value(serde_json::json!({ "applications": [] }));
        assert!(result.is_err());
    }
}
