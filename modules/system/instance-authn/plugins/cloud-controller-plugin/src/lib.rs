#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Cloud Controller Platform Plugin
//!
//! Resolves applications, organizations and spaces through the Cloud Foundry
//! Cloud Controller v2 API. Connecting discovers the UAA token endpoint from
//! `/v2/info` and obtains an access token with either the password grant
//! (`cf_username`/`cf_password`) or the client credentials grant
//! (`cf_client_id`/`cf_client_secret`).

pub mod domain;

pub use domain::{CloudControllerClient, CloudControllerConnector};
