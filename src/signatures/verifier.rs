//! PDF signature verification.
//!
//! Checks an [`ExtractedSignature`] against the bytes it claims to cover:
//! the CMS `messageDigest` must equal SHA-256 of the signed data and the
//! RSA signature over the signed attributes must verify under the embedded
//! signer certificate. Trust in that certificate is reported separately and
//! only when trusted roots are configured.

use super::byterange::ByteRangeCalculator;
use super::credentials::{certificate_common_name, certificate_public_key};
use super::extractor::ExtractedSignature;
use super::types::{VerificationResult, VerificationStatus};
use crate::error::{Error, Result};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::db::{rfc5911, rfc5912};
use der::{Decode, Encode, Tag, Tagged};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use signature::Verifier;
use x509_cert::Certificate;

/// Verifier for PDF digital signatures.
#[derive(Debug, Default)]
pub struct SignatureVerifier {
    /// Trusted root certificates (DER-encoded)
    trusted_roots: Vec<Vec<u8>>,
}

/// What the CMS check learned about the signer.
struct SignerCheck {
    cert_der: Vec<u8>,
    embedded: Vec<Vec<u8>>,
}

impl SignatureVerifier {
    /// Create a new signature verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trusted root certificate.
    pub fn add_trusted_root(&mut self, cert_der: Vec<u8>) {
        self.trusted_roots.push(cert_der);
    }

    /// Verify a signature extracted from a file of `file_size` bytes.
    ///
    /// Cryptographic failures produce [`VerificationStatus::Invalid`] with an
    /// explanatory message.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the signature is not a CMS `SignedData`
    /// structure at all.
    pub fn verify(&self, extracted: &ExtractedSignature, file_size: usize) -> Result<VerificationResult> {
        let covers_whole_document =
            ByteRangeCalculator::validate_byte_range(&extracted.byte_range, file_size).is_ok();
        let mut result = VerificationResult {
            status: VerificationStatus::Invalid,
            signer_common_name: None,
            covers_whole_document,
            byte_range: extracted.byte_range,
            messages: Vec::new(),
        };

        let signed_data = parse_signed_data(&extracted.signature)?;
        match check_signer(&signed_data, &extracted.signed_data) {
            Ok(check) => {
                result.signer_common_name = certificate_common_name(&check.cert_der);
                result.status = VerificationStatus::Valid;
                if !covers_whole_document {
                    result.status = VerificationStatus::ValidWithWarnings;
                    result
                        .messages
                        .push("ByteRange does not cover the whole document".to_string());
                }
                if !self.trusted_roots.is_empty() && !self.is_trusted(&check) {
                    result.status = VerificationStatus::ValidWithWarnings;
                    result.messages.push("Certificate is not trusted".to_string());
                }
            },
            Err(e) => {
                result
                    .messages
                    .push(format!("Signature verification failed: {}", e));
            },
        }

        log::debug!(
            "verified signature over {:?}: {:?} {:?}",
            result.byte_range,
            result.status,
            result.messages
        );
        Ok(result)
    }

    /// Whether the signer or a certificate shipped with it is a trusted root.
    fn is_trusted(&self, check: &SignerCheck) -> bool {
        std::iter::once(&check.cert_der)
            .chain(check.embedded.iter())
            .any(|cert| self.trusted_roots.contains(cert))
    }
}

fn parse_signed_data(der: &[u8]) -> Result<SignedData> {
    let content_info =
        ContentInfo::from_der(der).map_err(|e| Error::Parse(format!("signature is not CMS: {}", e)))?;
    if content_info.content_type != rfc5911::ID_SIGNED_DATA {
        return Err(Error::Parse(format!(
            "CMS content type {} is not signed-data",
            content_info.content_type
        )));
    }
    let inner = content_info.content.to_der()?;
    SignedData::from_der(&inner).map_err(|e| Error::Parse(format!("malformed CMS SignedData: {}", e)))
}

fn check_signer(signed_data: &SignedData, content: &[u8]) -> Result<SignerCheck> {
    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or_else(|| Error::Signing("no signer info".to_string()))?;
    if signer_info.digest_alg.oid != rfc5912::ID_SHA_256 {
        return Err(Error::Signing(format!(
            "unsupported digest algorithm {}",
            signer_info.digest_alg.oid
        )));
    }

    let signed_attrs = signer_info
        .signed_attrs
        .as_ref()
        .ok_or_else(|| Error::Signing("signer info has no signed attributes".to_string()))?;
    let message_digest = signed_attrs
        .iter()
        .find(|attr| attr.oid == rfc5911::ID_MESSAGE_DIGEST)
        .and_then(|attr| attr.values.iter().next())
        .filter(|value| value.tag() == Tag::OctetString)
        .ok_or_else(|| Error::Signing("missing messageDigest attribute".to_string()))?;
    if message_digest.value() != Sha256::digest(content).as_slice() {
        return Err(Error::Signing("messageDigest does not match the signed bytes".to_string()));
    }

    let embedded: Vec<Vec<u8>> = match &signed_data.certificates {
        Some(set) => set
            .0
            .iter()
            .filter_map(|choice| match choice {
                CertificateChoices::Certificate(cert) => Some(cert.to_der()),
                _ => None,
            })
            .collect::<std::result::Result<_, _>>()?,
        None => Vec::new(),
    };
    let cert_der = find_signer_certificate(signer_info, &embedded)?;

    let verifying_key = VerifyingKey::<Sha256>::new(certificate_public_key(&cert_der)?);
    let signature = Signature::try_from(signer_info.signature.as_bytes())
        .map_err(|e| Error::Signing(format!("malformed RSA signature: {}", e)))?;
    verifying_key
        .verify(&signed_attrs.to_der()?, &signature)
        .map_err(|_| Error::Signing("RSA signature does not verify".to_string()))?;

    Ok(SignerCheck { cert_der, embedded })
}

fn find_signer_certificate(signer_info: &SignerInfo, embedded: &[Vec<u8>]) -> Result<Vec<u8>> {
    let SignerIdentifier::IssuerAndSerialNumber(sid) = &signer_info.sid else {
        return Err(Error::Signing("signer identified by key id is not supported".to_string()));
    };
    embedded
        .iter()
        .find(|der| {
            Certificate::from_der(der).is_ok_and(|cert| {
                cert.tbs_certificate.issuer == sid.issuer && cert.tbs_certificate.serial_number == sid.serial_number
            })
        })
        .cloned()
        .ok_or_else(|| Error::Signing("signer certificate is not embedded".to_string()))
}
