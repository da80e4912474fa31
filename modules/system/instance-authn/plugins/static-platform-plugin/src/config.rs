//! Configuration for the static platform plugin.

use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticPlatformPluginConfig {
    pub apps: Vec<AppRecord>,
    pub orgs: Vec<OrgRecord>,
    pub spaces: Vec<SpaceRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppRecord {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    /// Running instance count reported for the app.
    #[serde(default = "default_instances")]
    pub instances: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrgRecord {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceRecord {
    pub guid: String,
    pub name: String,
    pub organization_guid: String,
}

fn default_instances() -> i64 {
    1
}
