pub mod client;
pub mod connector;
mod dto;

pub use client::CloudControllerClient;
pub use connector::CloudControllerConnector;
