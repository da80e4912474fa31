//! Infrastructure adapters: role/config storage and X.509 verification.

pub mod storage;
pub mod x509;
