//! Domain layer for the instance `AuthN` module.

pub mod client_cache;
pub mod clock;
pub mod constraints;
pub mod error;
pub mod identity;
pub mod local_client;
pub mod repo;
pub mod role;
pub mod service;
pub mod signing_time;
pub mod time_window;
pub mod verifier;


pub use error::DomainError;
pub use local_client::InstanceAuthnLocalClient;
pub use service::Service;
