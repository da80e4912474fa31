#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Platform Plugin
//!
//! Serves application, organization and space records from configuration
//! instead of a live Cloud Controller. Intended for development and tests.
//!
//! ## Configuration
//!
//! ```yaml
//! apps:
//!   - guid: "2d3e834a-3a25-4591-974c-fa5626d5d0a1"
//!     name: "my-app"
//!     space_guid: "3d2eba6b-ef19-44d5-91dd-1975b0db5cc9"
//!     instances: 1
//! orgs:
//!   - guid: "34a878d0-c2f9-4521-ba73-a9f664e82c7bf"
//!     name: "my-org"
//! spaces:
//!   - guid: "3d2eba6b-ef19-44d5-91dd-1975b0db5cc9"
//!     name: "my-space"
//!     organization_guid: "34a878d0-c2f9-4521-ba73-a9f664e82c7bf"
//! ```

pub mod config;
pub mod domain;
pub mod module;

pub use module::StaticPlatformPlugin;
