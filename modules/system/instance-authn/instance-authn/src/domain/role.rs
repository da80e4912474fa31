//! Role definitions.

use std::time::Duration;

use instance_authn_sdk::{Auth, TokenParams};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// A named policy describing which instances may log in and what credential
/// they receive. Empty `bound_*` lists place no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleEntry {
    pub bound_org_ids: Vec<String>,
    pub bound_space_ids: Vec<String>,
    pub bound_app_ids: Vec<String>,
    pub bound_instance_ids: Vec<String>,

    /// Networks a caller must connect from. Checked before any
    /// certificate work.
    pub token_bound_cidrs: Vec<IpNet>,

    /// Skips comparing the caller's address with the certificate's IP SAN.
    pub disable_ip_matching: bool,

    pub token_policies: Vec<String>,
    #[serde(with = "duration_secs")]
    pub token_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub token_max_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub token_period: Duration,
}

impl RoleEntry {
    /// Fills the credential parameters of a freshly issued [`Auth`].
    pub fn populate_token_auth(&self, auth: &mut Auth) {
        auth.token = TokenParams {
            policies: self.token_policies.clone(),
            ttl: self.token_ttl,
            max_ttl: self.token_max_ttl,
            period: self.token_period,
            bound_cidrs: self.token_bound_cidrs.iter().map(ToString::to_string).collect(),
        };
    }

    /// Refreshes lifetimes at renewal. Policies and bound networks stay as
    /// issued.
    pub fn refresh_token_lifetimes(&self, token: &mut TokenParams) {
        token.ttl = self.token_ttl;
        token.max_ttl = self.token_max_ttl;
        token.period = self.token_period;
    }
}

/// Durations as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
