//! PDF Digital Signatures module.
//!
//! Embeds detached CMS signatures into existing PDFs through incremental
//! updates, and reads them back.
//!
//! ## Pipeline
//!
//! 1. [`add_placeholder`] appends a signature dictionary with a zero-filled
//!    `/Contents` and a fixed-width `/ByteRange`, plus the widget, AcroForm
//!    and page updates that reference it.
//! 2. [`PdfSigner::sign`] resolves the ByteRange in place, signs the covered
//!    bytes and writes the DER signature into `/Contents`.
//! 3. [`extract_signature`] and [`SignatureVerifier`] work on the final
//!    bytes without parsing the document.
//!
//! ## Signature Types Supported
//!
//! - PKCS#7 detached signatures (adbe.pkcs7.detached)
//! - PAdES signatures (ETSI.CAdES.detached)
//!
//! ## Example
//!
//! ```ignore
//! use pdf_sigil::signatures::{add_placeholder, PdfSigner, SignOptions, SigningCredentials};
//!
//! let credentials = SigningCredentials::from_pkcs12_file("cert.p12", "")?;
//! let prepared = add_placeholder(&std::fs::read("document.pdf")?, &SignOptions::default())?;
//! let signed = PdfSigner::new(credentials).sign(&prepared)?;
//! std::fs::write("signed_document.pdf", signed)?;
//! ```
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ETSI TS 102 778 - PAdES

mod byterange;
mod credentials;
mod extractor;
mod pkcs7;
mod placeholder;
mod signer;
mod types;
mod verifier;

pub use byterange::ByteRangeCalculator;
pub use credentials::SigningCredentials;
pub use extractor::{count_signatures, extract_signature, ExtractedSignature};
pub use pkcs7::{build_detached_signature, ID_AA_SIGNING_CERTIFICATE_V2};
pub use placeholder::{add_placeholder, signature_dictionary};
pub use signer::PdfSigner;
pub use types::{
    SignOptions, SignatureSubFilter, VerificationResult, VerificationStatus, DEFAULT_SIGNATURE_LENGTH,
};
pub use verifier::SignatureVerifier;
