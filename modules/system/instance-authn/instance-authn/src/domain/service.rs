//! Login, renewal and role resolution.

use std::sync::Arc;

use instance_authn_sdk::{Auth, ConnectionInfo, LoginRequest, PlatformClient, PlatformClientConnector};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::client_cache::{CacheStatus, PlatformClientCache};
use super::clock::Clock;
use super::constraints::{matches_ip_address, meets_bound_constraints, remote_addr_in_cidrs};
use super::error::DomainError;
use super::identity::{InstanceIdentity, PlatformNames, RenewalIdentity};
use super::repo::{ConfigRepository, RoleRepository};
use super::role::RoleEntry;
use super::signing_time::parse_signing_time;
use super::verifier::{CertificateVerifier, SignatureData};
use crate::config::InstanceAuthnConfig;

/// Instance `AuthN` service.
///
/// Logins and renewals hold the configuration lock for reading from the
/// moment they read the configuration until they return; configuration
/// writes take it exclusively.
pub struct Service {
    roles: Arc<dyn RoleRepository>,
    configs: Arc<dyn ConfigRepository>,
    verifier: Arc<dyn CertificateVerifier>,
    connector: Arc<dyn PlatformClientConnector>,
    clock: Arc<dyn Clock>,
    clients: PlatformClientCache,
    config_lock: RwLock<()>,
}

impl Service {
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        configs: Arc<dyn ConfigRepository>,
        verifier: Arc<dyn CertificateVerifier>,
        connector: Arc<dyn PlatformClientConnector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            roles,
            configs,
            verifier,
            connector,
            clock,
            clients: PlatformClientCache::new(),
            config_lock: RwLock::new(()),
        }
    }

    /// Authenticates an instance and issues its credential.
    ///
    /// # Errors
    /// - [`DomainError::Rejected`] when the request, its certificates or the
    ///   instance's platform state do not satisfy the role
    /// - [`DomainError::PermissionDenied`] when the caller's network is not
    ///   in the role's bound CIDRs
    /// - any other variant for backend or platform faults
    #[tracing::instrument(skip_all, fields(role = %request.role))]
    pub async fn login(
        &self,
        request: &LoginRequest,
        connection: Option<&ConnectionInfo>,
    ) -> Result<Auth, DomainError> {
        // Taken first so the window check measures the full request delay.
        let now = self.clock.now();

        if request.role.is_empty() {
            return Err(DomainError::rejected("'role' is required"));
        }
        let role = self
            .roles
            .get_role(&request.role)
            .await?
            .ok_or_else(|| DomainError::rejected("no matching role"))?;

        check_bound_cidrs(&role, connection)?;

        let signature = required_field(&request.signature, "signature")?;
        let cf_instance_cert = required_field(&request.cf_instance_cert, "cf_instance_cert")?;
        let signing_time_raw = required_field(&request.signing_time, "signing_time")?;
        let signing_time = parse_signing_time(signing_time_raw)
            .map_err(|e| DomainError::rejected(e.to_string()))?;

        let _config_guard = self.config_lock.read().await;
        let config = self.configs.get_config().await?.ok_or_else(|| {
            DomainError::NotConfigured(
                "no CA is configured for verifying client certificates".to_owned(),
            )
        })?;

        config
            .signing_window()
            .check(signing_time, now)
            .map_err(|v| DomainError::rejected(v.to_string()))?;

        let certs = self
            .verifier
            .extract_certificates(cf_instance_cert)
            .map_err(|e| DomainError::rejected(e.to_string()))?;
        let signing_cert = self
            .verifier
            .verify_signature(
                signature,
                &SignatureData {
                    signing_time,
                    cf_instance_cert,
                    role: &request.role,
                },
            )
            .map_err(|e| DomainError::rejected(e.to_string()))?;
        self.verifier
            .validate_chain(&config.identity_ca_certificates, &certs, &signing_cert, now)
            .map_err(|e| DomainError::rejected(e.to_string()))?;
        let identity = self
            .verifier
            .identity(&signing_cert)
            .map_err(|e| DomainError::Certificate(e.to_string()))?;
        debug!(
            instance_id = %identity.instance_id,
            app_id = %identity.app_id,
            "verified instance identity certificate"
        );

        let client = self.platform_client(&config).await?;
        cross_check(client.as_ref(), &role, &identity, connection).await?;
        let names = lookup_names(client.as_ref(), &identity).await?;

        let mut auth = identity.into_auth(&request.role, names);
        role.populate_token_auth(&mut auth);
        info!(
            instance_id = %auth.display_name,
            app_id = %auth.alias.name,
            "instance logged in"
        );
        Ok(auth)
    }

    /// Re-validates a previously issued credential against the current role
    /// and platform state.
    ///
    /// A failed check taints the platform client so the next request
    /// reconnects.
    ///
    /// # Errors
    /// - [`DomainError::Rejected`] when the instance no longer satisfies the
    ///   role
    /// - any other variant for backend faults, missing roles or corrupt
    ///   credential data
    #[tracing::instrument(skip_all, fields(role = %auth.internal_data.role))]
    pub async fn renew(
        &self,
        auth: Auth,
        connection: Option<&ConnectionInfo>,
    ) -> Result<Auth, DomainError> {
        let _config_guard = self.config_lock.read().await;
        let config = self.configs.get_config().await?.ok_or_else(|| {
            DomainError::NotConfigured(
                "no configuration is available for reaching the CF API".to_owned(),
            )
        })?;

        let renewal = RenewalIdentity::try_from(&auth)?;
        let role = self
            .roles
            .get_role(&renewal.role)
            .await?
            .ok_or_else(|| DomainError::Internal("no matching role".to_owned()))?;

        let client = self.platform_client(&config).await?;
        if let Err(e) = cross_check(client.as_ref(), &role, &renewal.identity, connection).await {
            let tainted = self.clients.taint(&client);
            warn!(error = %e, tainted, "renewal check failed");
            return Err(e);
        }

        let mut auth = auth;
        role.refresh_token_lifetimes(&mut auth.token);
        info!(instance_id = %auth.display_name, "credential renewed");
        Ok(auth)
    }

    /// Returns `role` unchanged when such a role exists.
    ///
    /// # Errors
    /// [`DomainError::Rejected`] for empty or unknown names.
    pub async fn resolve_role(&self, role: &str) -> Result<String, DomainError> {
        if role.is_empty() {
            return Err(DomainError::rejected("role is required"));
        }
        match self.roles.get_role(role).await? {
            Some(_) => Ok(role.to_owned()),
            None => Err(DomainError::rejected(format!("invalid role name {role:?}"))),
        }
    }

    /// Replaces the backend configuration and drops the cached platform
    /// client. Waits for in-flight logins and renewals.
    ///
    /// # Errors
    /// [`DomainError::Rejected`] for an incomplete configuration, or a
    /// storage fault.
    #[tracing::instrument(skip_all)]
    pub async fn write_config(&self, config: InstanceAuthnConfig) -> Result<(), DomainError> {
        config.validate().map_err(DomainError::Rejected)?;

        let _config_guard = self.config_lock.write().await;
        self.configs.put_config(config).await?;
        let had_client = self.clients.reset().await;
        info!(had_client, "backend configuration updated");
        Ok(())
    }

    /// State of the cached platform client.
    #[must_use]
    pub fn platform_client_status(&self) -> CacheStatus {
        self.clients.status()
    }

    async fn platform_client(
        &self,
        config: &InstanceAuthnConfig,
    ) -> Result<Arc<dyn PlatformClient>, DomainError> {
        let settings = config.platform_settings();
        self.clients
            .get_or_connect(|| self.connector.connect(&settings))
            .await
            .map_err(DomainError::Platform)
    }
}

fn required_field<'a>(value: &'a str, name: &str) -> Result<&'a str, DomainError> {
    if value.is_empty() {
        return Err(DomainError::rejected(format!("'{name}' is required")));
    }
    Ok(value)
}

fn check_bound_cidrs(role: &RoleEntry, connection: Option<&ConnectionInfo>) -> Result<(), DomainError> {
    if role.token_bound_cidrs.is_empty() {
        return Ok(());
    }
    let Some(connection) = connection else {
        warn!("token bound CIDRs found but no connection information available for validation");
        return Err(DomainError::PermissionDenied);
    };
    if !remote_addr_in_cidrs(&connection.remote_addr, &role.token_bound_cidrs) {
        return Err(DomainError::PermissionDenied);
    }
    Ok(())
}

/// Confirms that the platform agrees with the identity and that the identity
/// satisfies the role. Every failure is a rejection.
async fn cross_check(
    client: &dyn PlatformClient,
    role: &RoleEntry,
    identity: &InstanceIdentity,
    connection: Option<&ConnectionInfo>,
) -> Result<(), DomainError> {
    if !role.disable_ip_matching {
        let matched = connection
            .is_some_and(|c| matches_ip_address(&c.remote_addr, &identity.ip_address));
        if !matched {
            return Err(DomainError::rejected("no matching IP address"));
        }
    }

    let bound = [
        ("instance ID", &identity.instance_id, &role.bound_instance_ids),
        ("app ID", &identity.app_id, &role.bound_app_ids),
        ("org ID", &identity.org_id, &role.bound_org_ids),
        ("space ID", &identity.space_id, &role.bound_space_ids),
    ];
    for (label, value, constraints) in bound {
        if !meets_bound_constraints(value, constraints) {
            return Err(DomainError::rejected(format!(
                "{label} {value} doesn't match role constraints of {constraints:?}"
            )));
        }
    }

    let app = client
        .app_by_guid(&identity.app_id)
        .await
        .map_err(|e| DomainError::rejected(e.to_string()))?;
    expect_platform_id("app", &identity.app_id, &app.guid)?;
    expect_platform_id("space", &identity.space_id, &app.space_guid)?;
    if app.instances <= 0 {
        return Err(DomainError::rejected("app doesn't have any live instances"));
    }

    let org = client
        .org_by_guid(&identity.org_id)
        .await
        .map_err(|e| DomainError::rejected(e.to_string()))?;
    expect_platform_id("org", &identity.org_id, &org.guid)?;

    let space = client
        .space_by_guid(&identity.space_id)
        .await
        .map_err(|e| DomainError::rejected(e.to_string()))?;
    expect_platform_id("space", &identity.space_id, &space.guid)?;
    expect_platform_id("org", &identity.org_id, &space.organization_guid)?;

    Ok(())
}

fn expect_platform_id(kind: &str, cert_value: &str, api_value: &str) -> Result<(), DomainError> {
    if cert_value != api_value {
        return Err(DomainError::rejected(format!(
            "cert {kind} ID {cert_value} doesn't match API's expected one of {api_value}"
        )));
    }
    Ok(())
}

/// Display names for the alias metadata. Lookup failures are faults: the
/// identity has already been corroborated by [`cross_check`].
async fn lookup_names(
    client: &dyn PlatformClient,
    identity: &InstanceIdentity,
) -> Result<PlatformNames, DomainError> {
    let org = client
        .org_by_guid(&identity.org_id)
        .await
        .map_err(DomainError::Platform)?;
    let app = client
        .app_by_guid(&identity.app_id)
        .await
        .map_err(DomainError::Platform)?;
    let space = client
        .space_by_guid(&identity.space_id)
        .await
        .map_err(DomainError::Platform)?;

    Ok(PlatformNames {
        org_name: org.name,
        space_name: space.name,
        app_name: app.name,
    })
}
