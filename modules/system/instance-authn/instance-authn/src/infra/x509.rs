//! X.509 implementation of [`CertificateVerifier`].
//!
//! Instance bundles hold a leaf identity certificate and the CA certificate
//! that issued it. The leaf encodes the instance ID as its common name and
//! the `organization:`, `space:` and `app:` IDs as organizational units; its
//! single IP SAN is the instance's container address.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPublicKey};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;

use crate::domain::identity::InstanceIdentity;
use crate::domain::verifier::{
    Certificate, CertificateVerifier, InstanceCertificates, SignatureData, VerifyError,
};

const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";
const OU_ORGANIZATION: &str = "organization:";
const OU_SPACE: &str = "space:";
const OU_APP: &str = "app:";

#[derive(Debug, Default, Clone, Copy)]
pub struct X509Verifier;

impl X509Verifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CertificateVerifier for X509Verifier {
    fn extract_certificates(&self, bundle: &str) -> Result<InstanceCertificates, VerifyError> {
        let ders = parse_pem_certificates(bundle)
            .map_err(|e| VerifyError::Malformed(format!("couldn't parse instance certificates: {e}")))?;
        let [first, second] = <[Certificate; 2]>::try_from(ders).map_err(|ders| {
            VerifyError::Malformed(format!(
                "expected 2 instance certificates, but received {}",
                ders.len()
            ))
        })?;

        match (is_ca(&first)?, is_ca(&second)?) {
            (true, false) => Ok(InstanceCertificates {
                intermediate: first,
                identity: second,
            }),
            (false, true) => Ok(InstanceCertificates {
                intermediate: second,
                identity: first,
            }),
            _ => Err(VerifyError::Malformed(
                "instance certificates must be one CA certificate and one identity certificate"
                    .to_owned(),
            )),
        }
    }

    fn verify_signature(
        &self,
        signature: &str,
        data: &SignatureData<'_>,
    ) -> Result<Certificate, VerifyError> {
        let signature = decode_signature(signature)?;
        let digest = Sha256::digest(data.message()?.as_bytes());

        let certificates = parse_pem_certificates(data.cf_instance_cert)
            .map_err(|e| VerifyError::Malformed(format!("couldn't parse instance certificates: {e}")))?;
        for certificate in certificates {
            let Some(key) = rsa_public_key(&certificate) else {
                continue;
            };
            let signed = pss_salt_lengths(&key).into_iter().any(|salt_len| {
                key.verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, &signature)
                    .is_ok()
            });
            if signed {
                return Ok(certificate);
            }
        }

        Err(VerifyError::Signature(
            "none of the given certificates signed the given data".to_owned(),
        ))
    }

    fn validate_chain(
        &self,
        ca_certificates: &[String],
        certs: &InstanceCertificates,
        signing: &Certificate,
        now: OffsetDateTime,
    ) -> Result<(), VerifyError> {
        if signing != &certs.identity {
            return Err(VerifyError::Chain(
                "the signing certificate is not the identity certificate".to_owned(),
            ));
        }

        let roots = ca_certificates
            .iter()
            .map(|pem| parse_pem_certificates(pem))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| VerifyError::Chain(format!("couldn't parse configured CA certificates: {e}")))?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if roots.is_empty() {
            return Err(VerifyError::Chain("no CA certificates are configured".to_owned()));
        }

        let identity = parse_der(&certs.identity)?;
        let intermediate = parse_der(&certs.intermediate)?;

        check_validity(&identity, "identity", now)?;
        check_validity(&intermediate, "intermediate", now)?;
        verify_issued_by(&identity, &intermediate).map_err(|()| {
            VerifyError::Chain("identity certificate was not issued by the intermediate".to_owned())
        })?;

        for root_der in &roots {
            if root_der == &certs.intermediate {
                return Ok(());
            }
            let Ok(root) = parse_der(root_der) else {
                continue;
            };
            if check_validity(&root, "root", now).is_ok()
                && verify_issued_by(&intermediate, &root).is_ok()
            {
                return Ok(());
            }
        }

        Err(VerifyError::Chain(
            "x509: certificate signed by unknown authority".to_owned(),
        ))
    }

    fn identity(&self, certificate: &Certificate) -> Result<InstanceIdentity, VerifyError> {
        let cert = parse_der(certificate)?;
        let subject = cert.subject();

        let instance_id = subject
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .filter(|cn| !cn.is_empty())
            .ok_or_else(|| VerifyError::Identity("no instance ID on the certificate".to_owned()))?
            .to_owned();

        let units = subject
            .iter_organizational_unit()
            .filter_map(|ou| ou.as_str().ok())
            .collect::<Vec<_>>();
        let org_id = single_prefixed(&units, OU_ORGANIZATION)?;
        let space_id = single_prefixed(&units, OU_SPACE)?;
        let app_id = single_prefixed(&units, OU_APP)?;

        let ip_address = single_ip_san(&cert)?.to_string();

        Ok(InstanceIdentity {
            instance_id,
            org_id,
            space_id,
            app_id,
            ip_address,
        })
    }
}

fn parse_pem_certificates(input: &str) -> Result<Vec<Certificate>, pem::PemError> {
    Ok(pem::parse_many(input)?
        .into_iter()
        .filter(|block| block.tag() == PEM_CERTIFICATE_TAG)
        .map(|block| Certificate::from_der(block.into_contents()))
        .collect())
}

fn parse_der(certificate: &Certificate) -> Result<X509Certificate<'_>, VerifyError> {
    x509_parser::parse_x509_certificate(certificate.der())
        .map(|(_, cert)| cert)
        .map_err(|e| VerifyError::Malformed(format!("couldn't parse certificate: {e}")))
}

fn is_ca(certificate: &Certificate) -> Result<bool, VerifyError> {
    let cert = parse_der(certificate)?;
    Ok(cert
        .basic_constraints()
        .ok()
        .flatten()
        .is_some_and(|bc| bc.value.ca))
}

fn check_validity(cert: &X509Certificate<'_>, role: &str, now: OffsetDateTime) -> Result<(), VerifyError> {
    let now = now.unix_timestamp();
    let validity = cert.validity();
    if now < validity.not_before.timestamp() {
        return Err(VerifyError::Chain(format!("{role} certificate is not yet valid")));
    }
    if now > validity.not_after.timestamp() {
        return Err(VerifyError::Chain(format!("{role} certificate has expired")));
    }
    Ok(())
}

fn verify_issued_by(cert: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> Result<(), ()> {
    if cert.issuer().as_raw() != issuer.subject().as_raw() {
        return Err(());
    }
    cert.verify_signature(Some(issuer.public_key()))
        .map_err(|_| ())
}

fn rsa_public_key(certificate: &Certificate) -> Option<RsaPublicKey> {
    let cert = parse_der(certificate).ok()?;
    RsaPublicKey::from_public_key_der(cert.public_key().raw).ok()
}

/// Signers may use the largest salt the key allows or one the size of the
/// digest; both are accepted.
fn pss_salt_lengths(key: &RsaPublicKey) -> [usize; 2] {
    let digest_len = <Sha256 as Digest>::output_size();
    let em_len = (key.n().bits() - 1).div_ceil(8);
    [em_len.saturating_sub(digest_len + 2), digest_len]
}

fn decode_signature(signature: &str) -> Result<Vec<u8>, VerifyError> {
    let signature = signature.trim();
    URL_SAFE
        .decode(signature)
        .or_else(|_| STANDARD.decode(signature))
        .map_err(|e| VerifyError::Malformed(format!("couldn't decode signature: {e}")))
}

fn single_prefixed(units: &[&str], prefix: &str) -> Result<String, VerifyError> {
    let mut values = units.iter().filter_map(|ou| ou.strip_prefix(prefix));
    match (values.next(), values.next()) {
        (Some(value), None) if !value.is_empty() => Ok(value.to_owned()),
        (None, _) => Err(VerifyError::Identity(format!(
            "no {} found on the certificate",
            prefix.trim_end_matches(':')
        ))),
        _ => Err(VerifyError::Identity(format!(
            "expected exactly one {} on the certificate",
            prefix.trim_end_matches(':')
        ))),
    }
}

fn single_ip_san(cert: &X509Certificate<'_>) -> Result<IpAddr, VerifyError> {
    let san = cert
        .subject_alternative_name()
        .map_err(|e| VerifyError::Identity(format!("couldn't read subject alternative names: {e}")))?;
    let mut ips = san
        .iter()
        .flat_map(|ext| ext.value.general_names.iter())
        .filter_map(|name| match name {
            GeneralName::IPAddress(bytes) => ip_from_bytes(bytes),
            _ => None,
        });
    match (ips.next(), ips.next()) {
        (Some(ip), None) => Ok(ip),
        (None, _) => Err(VerifyError::Identity("no IP address on the certificate".to_owned())),
        _ => Err(VerifyError::Identity(
            "expected exactly one IP address on the certificate".to_owned(),
        )),
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    <[u8; 16]>::try_from(bytes)
        .ok()
        .map(|octets| IpAddr::V6(Ipv6Addr::from(octets)))
}
