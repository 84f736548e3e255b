//! Detached CMS (PKCS#7) `SignedData` construction.
//!
//! One signer identified by issuer and serial number, SHA-256 digests and an
//! RSA PKCS#1 v1.5 signature over the signed attributes. The content itself
//! is not embedded; `messageDigest` carries the SHA-256 of the ByteRange
//! bytes.

use crate::error::{Error, Result};
use crate::signatures::credentials::SigningCredentials;
use crate::signatures::types::SignatureSubFilter;
use cms::builder::{SignedDataBuilder, SignerInfoBuilder};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::signed_data::{EncapsulatedContentInfo, SignerIdentifier};
use const_oid::db::{rfc5911, rfc5912};
use const_oid::ObjectIdentifier;
use der::asn1::{OctetString, SetOfVec, UtcTime};
use der::{Any, Decode, Encode, Sequence};
use rsa::pkcs1v15::{Signature, SigningKey};
use sha2::{Digest, Sha256};
use spki::AlgorithmIdentifierOwned;
use std::time::SystemTime;
use x509_cert::attr::Attribute;
use x509_cert::time::Time;
use x509_cert::Certificate;

/// id-aa-signingCertificateV2 (RFC 5035).
pub const ID_AA_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

fn cms_error(context: &str, err: impl std::fmt::Debug) -> Error {
    Error::Signing(format!("{}: {:?}", context, err))
}

fn sha256_algorithm() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: rfc5912::ID_SHA_256,
        parameters: None,
    }
}

/// `signingTime` attribute for the current time.
fn signing_time_attribute() -> Result<Attribute> {
    let now = der::DateTime::from_system_time(SystemTime::now())?;
    let time = Time::UtcTime(UtcTime::from_date_time(now)?);
    Ok(Attribute {
        oid: rfc5911::ID_SIGNING_TIME,
        values: SetOfVec::try_from(vec![Any::encode_from(&time)?])?,
    })
}

/// `ESSCertIDv2` (RFC 5035 §3). `issuerSerial` is never emitted.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct EssCertIdV2 {
    /// Absent for the default, SHA-256
    #[asn1(optional = "true")]
    hash_algorithm: Option<AlgorithmIdentifierOwned>,
    cert_hash: OctetString,
}

/// `SigningCertificateV2` (RFC 5035 §3), without `policies`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct SigningCertificateV2 {
    certs: Vec<EssCertIdV2>,
}

/// ESS `signingCertificateV2` attribute binding the signer certificate.
fn signing_certificate_v2_attribute(certificate_der: &[u8]) -> Result<Attribute> {
    let value = SigningCertificateV2 {
        certs: vec![EssCertIdV2 {
            hash_algorithm: None,
            cert_hash: OctetString::new(Sha256::digest(certificate_der).to_vec())?,
        }],
    };
    Ok(Attribute {
        oid: ID_AA_SIGNING_CERTIFICATE_V2,
        values: SetOfVec::try_from(vec![Any::encode_from(&value)?])?,
    })
}

/// Build a DER-encoded detached CMS signature over `signed_data`.
pub fn build_detached_signature(
    credentials: &SigningCredentials,
    signed_data: &[u8],
    sub_filter: SignatureSubFilter,
) -> Result<Vec<u8>> {
    let certificate = Certificate::from_der(credentials.certificate_der())?;
    let digest = Sha256::digest(signed_data);
    let content = EncapsulatedContentInfo {
        econtent_type: rfc5911::ID_DATA,
        econtent: None,
    };
    let signer = SigningKey::<Sha256>::new(credentials.private_key().clone());
    let sid = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
        issuer: certificate.tbs_certificate.issuer.clone(),
        serial_number: certificate.tbs_certificate.serial_number.clone(),
    });

    let mut signer_info = SignerInfoBuilder::new(&signer, sid, sha256_algorithm(), &content, Some(digest.as_slice()))
        .map_err(|e| cms_error("signer info", e))?;
    let extra_attribute = match sub_filter {
        SignatureSubFilter::Pkcs7Detached => signing_time_attribute()?,
        SignatureSubFilter::CadesDetached => signing_certificate_v2_attribute(credentials.certificate_der())?,
    };
    signer_info
        .add_signed_attribute(extra_attribute)
        .map_err(|e| cms_error("signed attribute", e))?;

    let mut builder = SignedDataBuilder::new(&content);
    builder
        .add_digest_algorithm(sha256_algorithm())
        .map_err(|e| cms_error("digest algorithm", e))?;
    builder
        .add_certificate(CertificateChoices::Certificate(certificate))
        .map_err(|e| cms_error("certificate", e))?;
    for der in credentials.chain() {
        builder
            .add_certificate(CertificateChoices::Certificate(Certificate::from_der(der)?))
            .map_err(|e| cms_error("chain certificate", e))?;
    }
    builder
        .add_signer_info::<SigningKey<Sha256>, Signature>(signer_info)
        .map_err(|e| cms_error("signer", e))?;

    let content_info = builder.build().map_err(|e| cms_error("signed data", e))?;
    let der = content_info.to_der()?;
    log::debug!("built {} byte CMS signature ({})", der.len(), sub_filter.as_pdf_name());
    Ok(der)
}
