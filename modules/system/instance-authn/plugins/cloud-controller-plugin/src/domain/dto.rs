//! Wire types for the Cloud Controller v2 and UAA APIs. Unknown fields are
//! ignored.

use instance_authn_sdk::{PlatformApp, PlatformOrg, PlatformSpace};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    pub token_endpoint: String,
}

#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Resource<T> {
    pub metadata: Metadata,
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub struct AppEntity {
    pub name: String,
    pub space_guid: String,
    #[serde(default)]
    pub instances: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrgEntity {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpaceEntity {
    pub name: String,
    pub organization_guid: String,
}

impl From<Resource<AppEntity>> for PlatformApp {
    fn from(r: Resource<AppEntity>) -> Self {
        Self {
            guid: r.metadata.guid,
            name: r.entity.name,
            space_guid: r.entity.space_guid,
            instances: r.entity.instances,
        }
    }
}

impl From<Resource<OrgEntity>> for PlatformOrg {
    fn from(r: Resource<OrgEntity>) -> Self {
        Self {
            guid: r.metadata.guid,
            name: r.entity.name,
        }
    }
}

impl From<Resource<SpaceEntity>> for PlatformSpace {
    fn from(r: Resource<SpaceEntity>) -> Self {
        Self {
            guid: r.metadata.guid,
            name: r.entity.name,
            organization_guid: r.entity.organization_guid,
        }
    }
}
