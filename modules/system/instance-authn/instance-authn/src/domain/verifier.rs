//! Certificate verification seam.
//!
//! The login flow only depends on [`CertificateVerifier`]; the X.509
//! implementation lives in [`crate::infra::x509`].

use time::OffsetDateTime;

use super::identity::InstanceIdentity;
use super::signing_time::format_signing_time;

/// A DER-encoded certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    #[must_use]
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("der_len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// The two certificates of an instance bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceCertificates {
    /// The CA certificate issued to the cell.
    pub intermediate: Certificate,
    /// The leaf certificate carrying the instance identity.
    pub identity: Certificate,
}

/// Inputs covered by a login signature.
#[derive(Debug, Clone, Copy)]
pub struct SignatureData<'a> {
    pub signing_time: OffsetDateTime,
    pub cf_instance_cert: &'a str,
    pub role: &'a str,
}

impl SignatureData<'_> {
    /// The exact byte string that was signed: canonical signing time, then
    /// the bundle, then the role name.
    ///
    /// # Errors
    /// Fails only if the signing time cannot be formatted.
    pub fn message(&self) -> Result<String, VerifyError> {
        let signing_time = format_signing_time(self.signing_time)
            .map_err(|e| VerifyError::Malformed(format!("couldn't format signing time: {e}")))?;
        Ok(format!(
            "{signing_time}{}{}",
            self.cf_instance_cert, self.role
        ))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    Signature(String),

    #[error("{0}")]
    Chain(String),

    #[error("{0}")]
    Identity(String),
}

/// Verification steps of a login, in the order they run.
pub trait CertificateVerifier: Send + Sync {
    /// Splits the instance bundle into its intermediate and identity
    /// certificates.
    ///
    /// # Errors
    /// Fails unless the bundle holds exactly one CA and one leaf certificate.
    fn extract_certificates(&self, bundle: &str) -> Result<InstanceCertificates, VerifyError>;

    /// Returns the bundle certificate whose key produced `signature` over
    /// `data`.
    ///
    /// # Errors
    /// Fails if the signature cannot be decoded or no certificate matches.
    fn verify_signature(
        &self,
        signature: &str,
        data: &SignatureData<'_>,
    ) -> Result<Certificate, VerifyError>;

    /// Checks that `signing` is the identity certificate and that it chains
    /// through the intermediate to one of `ca_certificates`, valid at `now`.
    ///
    /// # Errors
    /// Fails on any broken link of the chain.
    fn validate_chain(
        &self,
        ca_certificates: &[String],
        certs: &InstanceCertificates,
        signing: &Certificate,
        now: OffsetDateTime,
    ) -> Result<(), VerifyError>;

    /// Reads the instance identity fields from a verified certificate.
    ///
    /// # Errors
    /// Fails if a required field is missing or repeated.
    fn identity(&self, certificate: &Certificate) -> Result<InstanceIdentity, VerifyError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn message_concatenates_time_bundle_and_role() {
        let data = SignatureData {
            signing_time: datetime!(2026-10-16 12:00:00 UTC),
            cf_instance_cert: "BUNDLE\n",
            role: "web",
        };
        assert_eq!(data.message().unwrap(), "2026-10-16T12:00:00ZBUNDLE\nweb");
    }

    #[test]
    fn certificate_debug_hides_contents() {
        let cert = Certificate::from_der(vec![1, 2, 3]);
        assert_eq!(format!("{cert:?}"), "Certificate { der_len: 3, .. }");
    }
}
