#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end login and renewal with real instance identity certificates.
//!
//! The fixtures hold an instance bundle issued by `ca.pem` and signatures made
//! with the identity key over `2026-10-16T12:00:00Z` + bundle + `test-role`.

use std::sync::Arc;
use std::time::Duration;

use instance_authn::config::{InstanceAuthnConfig, InstanceAuthnModuleConfig};
use instance_authn::domain::clock::FixedClock;
use instance_authn::domain::role::RoleEntry;
use instance_authn::InstanceAuthn;
use instance_authn_sdk::{ConnectionInfo, InstanceAuthnClient, InstanceAuthnError, LoginRequest};
use static_platform_plugin::StaticPlatformPlugin;
use static_platform_plugin::config::StaticPlatformPluginConfig;
use time::OffsetDateTime;
use time::macros::datetime;

const CA: &str = include_str!("fixtures/ca.pem");
const UNTRUSTED_CA: &str = include_str!("fixtures/untrusted_ca.pem");
const BUNDLE: &str = include_str!("fixtures/instance.crt");
const SIGNATURE: &str = include_str!("fixtures/signature.txt");
const SIGNATURE_DIGEST_SALT: &str = include_str!("fixtures/signature_digest_salt.txt");

const ROLE: &str = "test-role";
const INSTANCE_ID: &str = "1bf2e7f6-2d1d-41ec-501c-c70";
const ORG_ID: &str = "34a878d0-c2f9-4521-ba73-a9f664e82c7bf";
const SPACE_ID: &str = "3d2eba6b-ef19-44d5-91dd-1975b0db5cc9";
const APP_ID: &str = "2d3e834a-3a25-4591-974c-fa5626d5d0a1";
const INSTANCE_IP: &str = "10.255.181.105";
const SIGNED_AT: OffsetDateTime = datetime!(2026-10-16 12:00:00 UTC);

fn platform_config(instances: i64) -> StaticPlatformPluginConfig {
    serde_json::from_value(serde_json::json!({
        "apps": [{ "guid": APP_ID, "name": "my-app", "space_guid": SPACE_ID, "instances": instances }],
        "orgs": [{ "guid": ORG_ID, "name": "my-org" }],
        "spaces": [{ "guid": SPACE_ID, "name": "my-space", "organization_guid": ORG_ID }]
    }))
    .unwrap()
}

fn module_config(ca: &str) -> InstanceAuthnModuleConfig {
    let mut cfg = InstanceAuthnModuleConfig {
        backend: Some(InstanceAuthnConfig {
            identity_ca_certificates: vec![ca.to_owned()],
            cf_api_addr: "https://api.sys.example.com".to_owned(),
            cf_username: "admin".to_owned(),
            ..InstanceAuthnConfig::default()
        }),
        ..InstanceAuthnModuleConfig::default()
    };
    cfg.roles.insert(
        ROLE.to_owned(),
        RoleEntry {
            bound_app_ids: vec![APP_ID.to_owned()],
            bound_org_ids: vec![ORG_ID.to_owned()],
            token_bound_cidrs: vec!["10.255.0.0/16".parse().unwrap()],
            token_policies: vec!["default".to_owned()],
            token_ttl: Duration::from_secs(300),
            ..RoleEntry::default()
        },
    );
    cfg
}

struct Setup {
    module: InstanceAuthn,
    client: Arc<dyn InstanceAuthnClient>,
}

fn setup_at(now: OffsetDateTime, ca: &str, instances: i64) -> Setup {
    let connector = StaticPlatformPlugin::default()
        .init(&platform_config(instances))
        .unwrap();
    let module = InstanceAuthn::default();
    let client = module
        .init_with_clock(&module_config(ca), connector, Arc::new(FixedClock(now)))
        .unwrap();
    Setup { module, client }
}

fn setup() -> Setup {
    setup_at(SIGNED_AT, CA, 1)
}

fn request(signature: &str) -> LoginRequest {
    LoginRequest {
        role: ROLE.to_owned(),
        cf_instance_cert: BUNDLE.to_owned(),
        signing_time: "2026-10-16T12:00:00Z".to_owned(),
        signature: signature.to_owned(),
    }
}

fn conn() -> Option<ConnectionInfo> {
    Some(ConnectionInfo::new(INSTANCE_IP))
}

#[tokio::test]
async fn login_with_instance_certificate() {
    let s = setup();
    let auth = s.client.login(request(SIGNATURE), conn()).await.unwrap();

    assert_eq!(auth.display_name, INSTANCE_ID);
    assert_eq!(auth.alias.name, APP_ID);
    assert_eq!(auth.alias.metadata.org_id, ORG_ID);
    assert_eq!(auth.alias.metadata.space_id, SPACE_ID);
    assert_eq!(auth.alias.metadata.app_name, "my-app");
    assert_eq!(auth.alias.metadata.org_name, "my-org");
    assert_eq!(auth.alias.metadata.space_name, "my-space");
    assert_eq!(auth.internal_data.ip_address, INSTANCE_IP);
    assert_eq!(auth.token.policies, vec!["default"]);
    assert_eq!(auth.token.bound_cidrs, vec!["10.255.0.0/16"]);
}

#[tokio::test]
async fn login_accepts_digest_length_salt() {
    let s = setup();
    s.client
        .login(request(SIGNATURE_DIGEST_SALT), conn())
        .await
        .unwrap();
}

#[tokio::test]
async fn login_accepts_shell_default_signing_time() {
    let s = setup();
    let mut req = request(SIGNATURE);
    req.signing_time = "Fri Oct 16 12:00:00 UTC 2026".to_owned();
    s.client.login(req, conn()).await.unwrap();
}

#[tokio::test]
async fn login_for_unknown_role_is_rejected() {
    let s = setup();
    assert_eq!(s.client.resolve_role(ROLE).await.unwrap(), ROLE);
    assert_eq!(
        s.client.resolve_role("other-role").await.unwrap_err(),
        InstanceAuthnError::Rejected("invalid role name \"other-role\"".to_owned())
    );

    let mut req = request(SIGNATURE);
    req.role = "other-role".to_owned();
    let err = s.client.login(req, conn()).await.unwrap_err();
    assert_eq!(err, InstanceAuthnError::Rejected("no matching role".to_owned()));
}

#[tokio::test]
async fn login_outside_signing_window_is_rejected() {
    let s = setup_at(datetime!(2026-10-16 12:05:01 UTC), CA, 1);
    let err = s.client.login(request(SIGNATURE), conn()).await.unwrap_err();
    match err {
        InstanceAuthnError::Rejected(msg) => assert!(msg.starts_with("request is too old"), "{msg}"),
        other => panic!("Expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn login_with_untrusted_ca_is_rejected() {
    let s = setup_at(SIGNED_AT, UNTRUSTED_CA, 1);
    let err = s.client.login(request(SIGNATURE), conn()).await.unwrap_err();
    assert_eq!(
        err,
        InstanceAuthnError::Rejected("x509: certificate signed by unknown authority".to_owned())
    );
}

#[tokio::test]
async fn login_from_other_network_is_denied() {
    let s = setup();
    let err = s
        .client
        .login(request(SIGNATURE), Some(ConnectionInfo::new("192.168.1.1")))
        .await
        .unwrap_err();
    assert_eq!(err, InstanceAuthnError::PermissionDenied);
}

#[tokio::test]
async fn login_for_stopped_app_is_rejected() {
    let s = setup_at(SIGNED_AT, CA, 0);
    let err = s.client.login(request(SIGNATURE), conn()).await.unwrap_err();
    assert_eq!(
        err,
        InstanceAuthnError::Rejected("app doesn't have any live instances".to_owned())
    );
}

#[tokio::test]
async fn renewal_of_issued_credential() {
    let s = setup();
    let auth = s.client.login(request(SIGNATURE), conn()).await.unwrap();

    let renewed = s.client.renew(auth.clone(), conn()).await.unwrap();
    assert_eq!(renewed, auth);

    let err = s
        .client
        .renew(auth, Some(ConnectionInfo::new("10.255.181.106")))
        .await
        .unwrap_err();
    assert_eq!(err, InstanceAuthnError::Rejected("no matching IP address".to_owned()));
}

#[tokio::test]
async fn rotating_the_ca_takes_effect_immediately() {
    let s = setup();
    let svc = s.module.service().unwrap();
    s.client.login(request(SIGNATURE), conn()).await.unwrap();

    let config = module_config(UNTRUSTED_CA).backend.unwrap();
    svc.write_config(config).await.unwrap();

    let err = s.client.login(request(SIGNATURE), conn()).await.unwrap_err();
    assert!(err.is_rejection());
}
