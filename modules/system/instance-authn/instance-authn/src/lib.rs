//! Instance `AuthN` Module
//!
//! Authenticates Cloud Foundry workload instances. A login presents the
//! instance identity certificate bundle and a signature made with its private
//! key; the module verifies the signature and the certificate chain, matches
//! the certificate's identity against the role's constraints and corroborates
//! it with the platform API before issuing an [`instance_authn_sdk::Auth`].
//!
//! Provides the [`instance_authn_sdk::InstanceAuthnClient`] implementation
//! through [`module::InstanceAuthn`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use module::InstanceAuthn;
