// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Sigil
//!
//! Embeds detached CMS/PKCS#7 signatures into existing PDF documents without
//! touching the bytes that were already there.
//!
//! ## Core Features
//!
//! ### Preparing
//! - **Structure Reading**: trailer, `startxref`, classic xref tables and `/Prev` chains
//! - **Incremental Updates**: new and replaced objects appended after the original bytes
//! - **Form Merge**: existing AcroForm fields and page annotations are preserved
//!
//! ### Signing
//! - **Length-Stable ByteRange**: fixed-width placeholder resolved in place
//! - **Detached CMS**: SHA-256 with RSA, signer certificate and chain embedded
//! - **PAdES**: `ETSI.CAdES.detached` with an ESS signingCertificateV2 attribute
//! - **PKCS#12 Credentials**: key and certificate matched by public key
//!
//! ### Reading Back
//! - **Extraction**: Nth signature located by its ByteRange
//! - **Verification**: message digest and RSA signature checks
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_sigil::api;
//! use pdf_sigil::signatures::{SignOptions, SigningCredentials};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = SigningCredentials::from_pkcs12_file("signer.p12", "")?;
//! let options = SignOptions::default().with_reason("Approved").with_location("Lisbon");
//!
//! let pdf = std::fs::read("contract.pdf")?;
//! let signed = api::sign_document(&pdf, &credentials, &options)?;
//! std::fs::write("contract-signed.pdf", signed)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Byte-level helpers
pub mod buffer;

// Core PDF parsing
pub mod lexer;
pub mod object;
pub mod parser;
pub mod reader;
pub mod xref;

// Incremental update writing
pub mod writer;

// Digital signatures
pub mod signatures;

// High-level API
pub mod api;

// Re-exports
pub use error::{Error, ErrorKind, Result};
pub use object::{Name, Object, ObjectRef};
pub use reader::{read_pdf, PdfStructure};
pub use signatures::{
    add_placeholder, extract_signature, PdfSigner, SignOptions, SignatureSubFilter, SignatureVerifier,
    SigningCredentials, VerificationResult, VerificationStatus,
};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
