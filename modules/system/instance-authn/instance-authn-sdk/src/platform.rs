//! Platform records and connection settings shared with platform plugins.

use std::time::Duration;

use secrecy::SecretString;

/// Application record as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformApp {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    /// Number of running instances the platform knows about.
    pub instances: i64,
}

/// Organization record as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOrg {
    pub guid: String,
    pub name: String,
}

/// Space record as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpace {
    pub guid: String,
    pub name: String,
    pub organization_guid: String,
}

/// Settings used by a [`crate::PlatformClientConnector`] to build a client.
#[derive(Debug, Clone, Default)]
pub struct PlatformSettings {
    /// Base address of the platform API, e.g. `https://api.sys.example.com`.
    pub api_addr: String,
    pub username: String,
    pub password: Option<SecretString>,
    pub client_id: String,
    pub client_secret: Option<SecretString>,
    /// Extra PEM-encoded roots trusted for the platform API.
    pub trusted_certificates: Vec<String>,
    /// Per-request timeout; `None` keeps the transport default.
    pub timeout: Option<Duration>,
}
