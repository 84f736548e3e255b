//! High-level signing API.
//!
//! One call takes an unsigned document to a signed one:
//!
//! ```ignore
//! use pdf_sigil::api;
//! use pdf_sigil::signatures::{SignOptions, SigningCredentials};
//!
//! let credentials = SigningCredentials::from_pkcs12(&p12_bytes, "")?;
//! let signed = api::sign_document(&pdf_bytes, &credentials, &SignOptions::default())?;
//!
//! // Base64 in, base64 out, for callers that move documents as text
//! let signed_b64 = api::add_digital_signature(&pdf_b64, &credentials, &SignOptions::default())?;
//! ```

use crate::error::{Error, Result};
use crate::signatures::{add_placeholder, PdfSigner, SignOptions, SigningCredentials};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Add a signature placeholder to `pdf` and sign it.
///
/// When `options.name` is unset the signer certificate's common name is
/// written to `/Name`.
pub fn sign_document(pdf: &[u8], credentials: &SigningCredentials, options: &SignOptions) -> Result<Vec<u8>> {
    let mut options = options.clone();
    if options.name.is_none() {
        options.name = credentials.common_name();
    }

    let prepared = add_placeholder(pdf, &options)?;
    let signer = PdfSigner::new(credentials.clone()).with_sub_filter(options.sub_filter);
    signer.sign(&prepared).map_err(|e| {
        log::error!("could not sign document: {}", e);
        e
    })
}

/// Sign a base64-encoded document, returning the signed document in base64.
///
/// # Errors
///
/// Returns an input error when `pdf_base64` is not valid base64, otherwise
/// whatever [`sign_document`] returns.
pub fn add_digital_signature(
    pdf_base64: &str,
    credentials: &SigningCredentials,
    options: &SignOptions,
) -> Result<String> {
    let pdf = STANDARD
        .decode(pdf_base64.trim())
        .map_err(|e| Error::Input(format!("document is not valid base64: {}", e)))?;
    let signed = sign_document(&pdf, credentials, options)?;
    Ok(STANDARD.encode(signed))
}

/// Load a PKCS#12 bundle and sign `pdf` with it.
pub fn sign_with_pkcs12(pdf: &[u8], pkcs12: &[u8], passphrase: &str, options: &SignOptions) -> Result<Vec<u8>> {
    let credentials = SigningCredentials::from_pkcs12(pkcs12, passphrase)?;
    sign_document(pdf, &credentials, options)
}
