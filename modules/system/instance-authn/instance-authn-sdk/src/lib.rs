//! Instance `AuthN` SDK
//!
//! This crate provides the public API for the `instance_authn` module:
//!
//! - [`InstanceAuthnClient`] - Public API trait for consumers
//! - [`PlatformClient`] / [`PlatformClientConnector`] - Plugin API traits for platform backends
//! - [`Auth`] - Issued authentication model, handed back verbatim on renewal
//! - [`InstanceAuthnError`] / [`PlatformError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use instance_authn_sdk::{ConnectionInfo, InstanceAuthnClient, LoginRequest};
//!
//! let auth = client
//!     .login(request, Some(ConnectionInfo::new("10.255.181.105")))
//!     .await?;
//!
//! // Later, extend the credential
//! let renewed = client.renew(auth, Some(ConnectionInfo::new("10.255.181.105"))).await?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod platform;
pub mod plugin_api;

// Re-export main types at crate root
pub use api::InstanceAuthnClient;
pub use error::{InstanceAuthnError, PlatformError};
pub use models::{Alias, AliasMetadata, Auth, ConnectionInfo, InternalData, LoginRequest, TokenParams};
pub use platform::{PlatformApp, PlatformOrg, PlatformSettings, PlatformSpace};
pub use plugin_api::{PlatformClient, PlatformClientConnector};
