//! Digital signature types and data structures.
//!
//! [`SignOptions`] doubles as the crate's configuration: it can be built in
//! code or deserialized from JSON, with every field optional.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default `/Contents` capacity in bytes (12288 hex digits).
pub const DEFAULT_SIGNATURE_LENGTH: usize = 6144;

/// Signature sub-filter type (signature format).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureSubFilter {
    /// adbe.pkcs7.detached - PKCS#7 detached signature
    #[default]
    #[serde(rename = "adbe.pkcs7.detached")]
    Pkcs7Detached,
    /// ETSI.CAdES.detached - PAdES CAdES signature
    #[serde(rename = "ETSI.CAdES.detached")]
    CadesDetached,
}

impl SignatureSubFilter {
    /// Get the PDF name for this sub-filter.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            SignatureSubFilter::Pkcs7Detached => "adbe.pkcs7.detached",
            SignatureSubFilter::CadesDetached => "ETSI.CAdES.detached",
        }
    }

    /// Parse a PDF name into a sub-filter type.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "adbe.pkcs7.detached" => Some(SignatureSubFilter::Pkcs7Detached),
            "ETSI.CAdES.detached" => Some(SignatureSubFilter::CadesDetached),
            _ => None,
        }
    }
}

/// Options for signing a PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignOptions {
    /// Capacity of `/Contents` in bytes of DER signature
    pub signature_length: usize,
    /// Signature sub-filter (format)
    pub sub_filter: SignatureSubFilter,
    /// Reason for signing
    pub reason: Option<String>,
    /// Contact information
    pub contact_info: Option<String>,
    /// Name of the signer; the certificate CN is used when unset
    pub name: Option<String>,
    /// Location where the document was signed
    pub location: Option<String>,
    /// Widget rectangle `[llx lly urx ury]`; all zeros makes it invisible
    pub widget_rect: [f64; 4],
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            signature_length: DEFAULT_SIGNATURE_LENGTH,
            sub_filter: SignatureSubFilter::Pkcs7Detached,
            reason: Some("Signed".to_string()),
            contact_info: None,
            name: None,
            location: None,
            widget_rect: [0.0; 4],
        }
    }
}

impl SignOptions {
    /// Load options from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: SignOptions =
            serde_json::from_str(json).map_err(|e| Error::Input(format!("invalid sign options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check option values that would produce an unusable placeholder.
    pub fn validate(&self) -> Result<()> {
        if self.signature_length == 0 {
            return Err(Error::Input("signature_length must be greater than zero".to_string()));
        }
        if self.widget_rect.iter().any(|v| !v.is_finite()) {
            return Err(Error::Input("widget_rect must contain finite numbers".to_string()));
        }
        Ok(())
    }

    /// Set the `/Contents` capacity in bytes.
    pub fn with_signature_length(mut self, bytes: usize) -> Self {
        self.signature_length = bytes;
        self
    }

    /// Set the signature sub-filter.
    pub fn with_sub_filter(mut self, sub_filter: SignatureSubFilter) -> Self {
        self.sub_filter = sub_filter;
        self
    }

    /// Set the reason for signing.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the contact information.
    pub fn with_contact_info(mut self, contact_info: impl Into<String>) -> Self {
        self.contact_info = Some(contact_info.into());
        self
    }

    /// Set the signer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the signing location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Make the signature visible at `rect` on the first page.
    pub fn with_widget_rect(mut self, rect: [f64; 4]) -> Self {
        self.widget_rect = rect;
        self
    }
}

/// Result of signature verification.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Overall verification status
    pub status: VerificationStatus,
    /// Common name of the signing certificate's subject
    pub signer_common_name: Option<String>,
    /// Whether the ByteRange spans the whole file apart from `/Contents`
    pub covers_whole_document: bool,
    /// The verified ByteRange
    pub byte_range: [usize; 4],
    /// Verification messages (errors, warnings)
    pub messages: Vec<String>,
}

/// Verification status of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Signature is valid
    Valid,
    /// Signature is invalid (cryptographically)
    Invalid,
    /// Signature is valid but does not cover the whole document
    ValidWithWarnings,
}

impl VerificationStatus {
    /// Check if the status indicates a valid signature.
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationStatus::Valid)
    }

    /// Check if the status indicates any form of validity (including warnings).
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationStatus::Valid | VerificationStatus::ValidWithWarnings)
    }
}
