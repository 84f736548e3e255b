//! Signing credentials loaded from a PKCS#12 bundle.
//!
//! The bundle is decrypted with OpenSSL; everything after that (key
//! matching, CMS construction) runs on the pure-Rust `rsa` / `x509-cert`
//! stack.

use crate::error::{Error, Result};
use der::{Decode, Encode};
use openssl::pkcs12::Pkcs12;
use pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;
use x509_cert::Certificate;

/// Signer certificate, private key and the rest of the bundle's chain.
#[derive(Clone)]
pub struct SigningCredentials {
    /// DER-encoded X.509 certificate matching `private_key`
    certificate: Vec<u8>,
    /// Other certificates from the bundle, DER-encoded, in bundle order
    chain: Vec<Vec<u8>>,
    private_key: RsaPrivateKey,
}

impl SigningCredentials {
    /// Build credentials from a private key and candidate certificates.
    ///
    /// The certificate whose RSA modulus and exponent match the key becomes
    /// the signer; the others are kept as the chain.
    ///
    /// # Errors
    ///
    /// Returns an input error when no certificate matches the key.
    pub fn from_parts(certificates: Vec<Vec<u8>>, private_key: RsaPrivateKey) -> Result<Self> {
        let signer = certificates
            .iter()
            .position(|der| match certificate_public_key(der) {
                Ok(public) => public.n() == private_key.n() && public.e() == private_key.e(),
                Err(e) => {
                    log::debug!("skipping certificate without usable RSA key: {}", e);
                    false
                },
            })
            .ok_or_else(|| Error::Input("no certificate matches the private key".to_string()))?;

        let mut chain = certificates;
        let certificate = chain.remove(signer);
        Ok(Self {
            certificate,
            chain,
            private_key,
        })
    }

    /// Load credentials from a PKCS#12 (.p12/.pfx) buffer.
    ///
    /// # Errors
    ///
    /// Returns an input error when the buffer is not PKCS#12, the passphrase
    /// is wrong, the key is not RSA, or no certificate matches the key.
    pub fn from_pkcs12(data: &[u8], passphrase: &str) -> Result<Self> {
        let pkcs12 =
            Pkcs12::from_der(data).map_err(|e| Error::Input(format!("not a PKCS#12 bundle: {}", e)))?;
        let parsed = pkcs12
            .parse2(passphrase)
            .map_err(|e| Error::Input(format!("cannot decrypt PKCS#12 bundle: {}", e)))?;

        let pkey = parsed
            .pkey
            .ok_or_else(|| Error::Input("PKCS#12 bundle has no private key".to_string()))?;
        if pkey.id() != openssl::pkey::Id::RSA {
            return Err(Error::Input(format!("unsupported private key type {:?}", pkey.id())));
        }
        let key_der = pkey
            .private_key_to_der()
            .map_err(|e| Error::Input(format!("cannot export private key: {}", e)))?;
        let private_key = decode_rsa_private_key(&key_der)?;

        let mut certificates = Vec::new();
        if let Some(cert) = parsed.cert {
            certificates.push(cert.to_der().map_err(|e| Error::Input(format!("cannot export certificate: {}", e)))?);
        }
        if let Some(ca) = parsed.ca {
            for cert in ca {
                certificates
                    .push(cert.to_der().map_err(|e| Error::Input(format!("cannot export certificate: {}", e)))?);
            }
        }
        log::debug!("PKCS#12 bundle holds {} certificates", certificates.len());

        Self::from_parts(certificates, private_key)
    }

    /// Load credentials from a PKCS#12 file.
    pub fn from_pkcs12_file(path: impl AsRef<Path>, passphrase: &str) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_pkcs12(&data, passphrase)
    }

    /// DER-encoded signer certificate.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate
    }

    /// DER-encoded certificates other than the signer's.
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// The RSA signing key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Subject common name of the signer certificate.
    pub fn common_name(&self) -> Option<String> {
        certificate_common_name(&self.certificate)
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("certificate", &format!("{} bytes", self.certificate.len()))
            .field("private_key", &"[REDACTED]")
            .field("chain", &format!("{} certificates", self.chain.len()))
            .finish()
    }
}

fn decode_rsa_private_key(der: &[u8]) -> Result<RsaPrivateKey> {
    use pkcs1::DecodeRsaPrivateKey;
    use pkcs8::DecodePrivateKey;

    RsaPrivateKey::from_pkcs1_der(der)
        .or_else(|_| RsaPrivateKey::from_pkcs8_der(der))
        .map_err(|e| Error::Input(format!("cannot decode RSA private key: {}", e)))
}

/// RSA public key from a DER certificate's SubjectPublicKeyInfo.
pub(crate) fn certificate_public_key(der: &[u8]) -> Result<RsaPublicKey> {
    let certificate = Certificate::from_der(der)
        .map_err(|e| Error::Input(format!("invalid X.509 certificate: {}", e)))?;
    let spki = certificate.tbs_certificate.subject_public_key_info.to_der()?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| Error::Input(format!("certificate key is not RSA: {}", e)))
}

/// Subject CN of a DER certificate.
pub(crate) fn certificate_common_name(der: &[u8]) -> Option<String> {
    let (_, certificate) = x509_parser::parse_x509_certificate(der).ok()?;
    let cn = certificate.subject().iter_common_name().next()?;
    cn.as_str().ok().map(str::to_string)
}
