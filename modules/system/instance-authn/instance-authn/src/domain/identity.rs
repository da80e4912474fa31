//! Instance identities derived from certificates and from issued credentials.

use instance_authn_sdk::{Alias, AliasMetadata, Auth, InternalData, TokenParams};

use super::error::DomainError;

/// Identity fields carried by a verified instance identity certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub instance_id: String,
    pub org_id: String,
    pub space_id: String,
    pub app_id: String,
    pub ip_address: String,
}

/// Display names resolved from the platform at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformNames {
    pub org_name: String,
    pub space_name: String,
    pub app_name: String,
}

impl InstanceIdentity {
    /// Builds the credential issued for this identity under `role`.
    /// Token parameters are left for the role to fill.
    #[must_use]
    pub fn into_auth(self, role: &str, names: PlatformNames) -> Auth {
        Auth {
            internal_data: InternalData {
                role: role.to_owned(),
                instance_id: self.instance_id.clone(),
                ip_address: self.ip_address,
            },
            display_name: self.instance_id,
            alias: Alias {
                name: self.app_id.clone(),
                metadata: AliasMetadata {
                    org_id: self.org_id,
                    app_id: self.app_id,
                    space_id: self.space_id,
                    org_name: names.org_name,
                    app_name: names.app_name,
                    space_name: names.space_name,
                },
            },
            token: TokenParams::default(),
        }
    }
}

/// Identity recovered from a previously issued [`Auth`] at renewal time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalIdentity {
    pub role: String,
    pub identity: InstanceIdentity,
}

impl TryFrom<&Auth> for RenewalIdentity {
    type Error = DomainError;

    fn try_from(auth: &Auth) -> Result<Self, Self::Error> {
        let meta = &auth.alias.metadata;
        Ok(Self {
            role: required("role", &auth.internal_data.role)?,
            identity: InstanceIdentity {
                instance_id: required("instance_id", &auth.internal_data.instance_id)?,
                ip_address: required("ip_address", &auth.internal_data.ip_address)?,
                org_id: required("org_id", &meta.org_id)?,
                app_id: required("app_id", &meta.app_id)?,
                space_id: required("space_id", &meta.space_id)?,
            },
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    if value.is_empty() {
        return Err(DomainError::CorruptRenewalData(format!(
            "unable to retrieve {field:?} during renewal, not a string"
        )));
    }
    Ok(value.to_owned())
}
