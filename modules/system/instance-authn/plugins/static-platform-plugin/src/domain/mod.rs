pub mod client;
pub mod service;

pub use client::StaticPlatformConnector;
pub use service::Service;
