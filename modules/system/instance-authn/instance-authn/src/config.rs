//! Configuration for the instance `AuthN` module.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use instance_authn_sdk::PlatformSettings;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::domain::role::RoleEntry;
use crate::domain::time_window::SigningWindow;

/// Prefix for environment overrides, e.g.
/// `INSTANCE_AUTHN__BACKEND__CF_API_ADDR=https://api.sys.example.com`.
pub const ENV_PREFIX: &str = "INSTANCE_AUTHN__";

const DEFAULT_LOGIN_MAX_SECONDS_NOT_BEFORE: u64 = 300;
const DEFAULT_LOGIN_MAX_SECONDS_NOT_AFTER: u64 = 60;

/// Backend configuration: trusted identity roots, platform API access and
/// the login signing window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceAuthnConfig {
    /// PEM-encoded root certificates for the instance identity CA. Each entry
    /// may hold several certificates.
    pub identity_ca_certificates: Vec<String>,

    /// Platform API address, e.g. `https://api.sys.example.com`.
    pub cf_api_addr: String,
    pub cf_username: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub cf_password: Option<SecretString>,
    pub cf_client_id: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub cf_client_secret: Option<SecretString>,
    /// Extra PEM-encoded roots trusted when talking to the platform API.
    pub cf_api_trusted_certificates: Vec<String>,
    /// Platform API request timeout in seconds; `0` keeps the client default.
    pub cf_timeout_secs: u64,

    /// How far in the past a signing time may be.
    pub login_max_seconds_not_before: u64,
    /// How far in the future a signing time may be.
    pub login_max_seconds_not_after: u64,
}

impl Default for InstanceAuthnConfig {
    fn default() -> Self {
        Self {
            identity_ca_certificates: Vec::new(),
            cf_api_addr: String::new(),
            cf_username: String::new(),
            cf_password: None,
            cf_client_id: String::new(),
            cf_client_secret: None,
            cf_api_trusted_certificates: Vec::new(),
            cf_timeout_secs: 0,
            login_max_seconds_not_before: DEFAULT_LOGIN_MAX_SECONDS_NOT_BEFORE,
            login_max_seconds_not_after: DEFAULT_LOGIN_MAX_SECONDS_NOT_AFTER,
        }
    }
}

impl InstanceAuthnConfig {
    #[must_use]
    pub fn signing_window(&self) -> SigningWindow {
        SigningWindow::new(
            Duration::from_secs(self.login_max_seconds_not_before),
            Duration::from_secs(self.login_max_seconds_not_after),
        )
    }

    /// Settings handed to the platform connector.
    #[must_use]
    pub fn platform_settings(&self) -> PlatformSettings {
        PlatformSettings {
            api_addr: self.cf_api_addr.clone(),
            username: self.cf_username.clone(),
            password: self.cf_password.clone(),
            client_id: self.cf_client_id.clone(),
            client_secret: self.cf_client_secret.clone(),
            trusted_certificates: self.cf_api_trusted_certificates.clone(),
            timeout: (self.cf_timeout_secs > 0).then(|| Duration::from_secs(self.cf_timeout_secs)),
        }
    }

    /// Checks the fields every login depends on.
    ///
    /// # Errors
    /// Returns a description of the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        if self.identity_ca_certificates.iter().all(|c| c.trim().is_empty()) {
            return Err("missing identity_ca_certificates".to_owned());
        }
        if self.cf_api_addr.trim().is_empty() {
            return Err("missing cf_api_addr".to_owned());
        }
        if self.cf_username.is_empty() && self.cf_client_id.is_empty() {
            return Err("either cf_username or cf_client_id is required".to_owned());
        }
        Ok(())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}

/// Module configuration: the initial backend configuration and the roles
/// available at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceAuthnModuleConfig {
    pub backend: Option<InstanceAuthnConfig>,
    pub roles: BTreeMap<String, RoleEntry>,
}

impl InstanceAuthnModuleConfig {
    /// Loads the module configuration from an optional YAML file, then
    /// applies `INSTANCE_AUTHN__*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a value fails to
    /// deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        let cfg = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(cfg)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn backend_defaults_match_signing_window_defaults() {
        let cfg = InstanceAuthnConfig::default();
        let window = cfg.signing_window();
        assert_eq!(window.max_age(), Duration::from_secs(300));
        assert_eq!(window.max_skew(), Duration::from_secs(60));
    }

    #[test]
    fn zero_timeout_keeps_client_default() {
        let mut cfg = InstanceAuthnConfig::default();
        assert_eq!(cfg.platform_settings().timeout, None);
        cfg.cf_timeout_secs = 15;
        assert_eq!(
            cfg.platform_settings().timeout,
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn validate_reports_missing_fields() {
        let mut cfg = InstanceAuthnConfig::default();
        assert_eq!(
            cfg.validate().unwrap_err(),
            "missing identity_ca_certificates"
        );
        cfg.identity_ca_certificates = vec!["-----BEGIN CERTIFICATE-----".to_owned()];
        assert_eq!(cfg.validate().unwrap_err(), "missing cf_api_addr");
        cfg.cf_api_addr = "https://api.example.com".to_owned();
        assert!(cfg.validate().is_err());
        cfg.cf_client_id = "broker".to_owned();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_reads_yaml_roles_and_backend() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r"
backend:
  identity_ca_certificates: ['-----BEGIN CERTIFICATE-----']
  cf_api_addr: https://api.example.com
  cf_username: admin
  cf_password: s3cret
  login_max_seconds_not_after: 30
roles:
  web:
    bound_app_ids: [app-1]
    token_bound_cidrs: [10.0.0.0/8]
    token_policies: [default]
    token_ttl: 600
"
        )
        .unwrap();

        let cfg = InstanceAuthnModuleConfig::load(Some(file.path())).unwrap();
        let backend = cfg.backend.unwrap();
        assert_eq!(backend.cf_api_addr, "https://api.example.com");
        assert_eq!(
            backend.cf_password.as_ref().unwrap().expose_secret(),
            "s3cret"
        );
        assert_eq!(backend.login_max_seconds_not_before, 300);
        assert_eq!(backend.login_max_seconds_not_after, 30);

        let web = &cfg.roles["web"];
        assert_eq!(web.bound_app_ids, vec!["app-1".to_owned()]);
        assert_eq!(web.token_ttl, Duration::from_secs(600));
        assert_eq!(web.token_bound_cidrs.len(), 1);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "backend:\n  cf_api_address: nope\n").unwrap();
        assert!(InstanceAuthnModuleConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(InstanceAuthnModuleConfig::load(Some(&missing)).is_err());
    }
}
