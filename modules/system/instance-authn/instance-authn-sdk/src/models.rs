//! Domain models for the instance `AuthN` module.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Login request presented by a workload instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Name of the pre-configured role to authenticate against.
    pub role: String,
    /// Full PEM bundle read from the instance's `CF_INSTANCE_CERT` file.
    pub cf_instance_cert: String,
    /// Time the signature was produced, ISO-8601 or shell-default format.
    pub signing_time: String,
    /// Signature over `(signing_time, cf_instance_cert, role)` made with the
    /// identity certificate's private key.
    pub signature: String,
}

/// Connection metadata supplied by the host for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Remote address, optionally with a `/NN` suffix.
    pub remote_addr: String,
}

impl ConnectionInfo {
    #[must_use]
    pub fn new(remote_addr: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
        }
    }
}

/// Data kept by the broker alongside the credential. Not visible to the
/// caller; returned verbatim at renewal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InternalData {
    pub role: String,
    pub instance_id: String,
    pub ip_address: String,
}

/// Alias metadata describing the authenticated application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasMetadata {
    pub org_id: String,
    pub app_id: String,
    pub space_id: String,
    pub org_name: String,
    pub app_name: String,
    pub space_name: String,
}

/// Stable per-application identity. `name` is always the application ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alias {
    pub name: String,
    pub metadata: AliasMetadata,
}

/// Credential lifetime and scope, copied from the role at login and
/// refreshed from the role at renewal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenParams {
    pub policies: Vec<String>,
    pub ttl: Duration,
    pub max_ttl: Duration,
    pub period: Duration,
    pub bound_cidrs: Vec<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Auth {
    pub internal_data: InternalData,
    /// Equal to the instance ID.
    pub display_name: String,
    pub alias: Alias,
    #[serde(default)]
    pub token: TokenParams,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sample_auth() -> Auth {
        Auth {
            internal_data: InternalData {
                role: "web".to_owned(),
                instance_id: "instance-1".to_owned(),
                ip_address: "10.0.0.5".to_owned(),
            },
            display_name: "instance-1".to_owned(),
            alias: Alias {
                name: "app-1".to_owned(),
                metadata: AliasMetadata {
                    org_id: "org-1".to_owned(),
                    app_id: "app-1".to_owned(),
                    space_id: "space-1".to_owned(),
                    org_name: "acme".to_owned(),
                    app_name: "web".to_owned(),
                    space_name: "prod".to_owned(),
                },
            },
            token: TokenParams {
                policies: vec!["default".to_owned()],
                ttl: Duration::from_secs(60),
                ..TokenParams::default()
            },
        }
    }

    #[test]
    fn auth_survives_storage_serialization() {
        let auth = sample_auth();
        let stored = serde_json::to_value(&auth).unwrap();

        assert_eq!(stored["internal_data"]["instance_id"], "instance-1");
        assert_eq!(stored["alias"]["metadata"]["app_id"], "app-1");

        let restored: Auth = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, auth);
    }

    #[test]
    fn stored_auth_missing_internal_field_is_rejected() {
        let mut stored = serde_json::to_value(sample_auth()).unwrap();
        stored["internal_data"]
            .as_object_mut()
            .unwrap()
            .remove("ip_address");

        let result: Result<Auth, _> = serde_json::from_value(stored);
        assert!(result.is_err());
    }

    #[test]
    fn login_request_fields_default_to_empty() {
        let request: LoginRequest = serde_json::from_str(r#"{"role":"web"}"#).unwrap();

        assert_eq!(request.role, "web");
        assert!(request.signature.is_empty());
        assert!(request.cf_instance_cert.is_empty());
    }
}
