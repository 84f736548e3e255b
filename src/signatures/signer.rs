//! PDF signing implementation.
//!
//! Takes a document that already carries a signature placeholder (see
//! [`add_placeholder`](crate::signatures::add_placeholder)), fixes the
//! ByteRange, signs the covered bytes and splices the signature into
//! `/Contents`. The output has exactly the length of the input.

use super::byterange::ByteRangeCalculator;
use super::credentials::SigningCredentials;
use super::pkcs7::build_detached_signature;
use super::types::SignatureSubFilter;
use crate::buffer;
use crate::error::{Error, Result};
use crate::writer::{ByteRangeArray, LengthStable};

/// PDF signer that creates digital signatures.
#[derive(Debug, Clone)]
pub struct PdfSigner {
    credentials: SigningCredentials,
    sub_filter: SignatureSubFilter,
}

/// Where the placeholder pieces sit inside a prepared document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaceholderLocation {
    /// Offset of the `[` that starts the ByteRange placeholder
    byte_range_pos: usize,
    /// Offset of the `<` that opens `/Contents`
    contents_pos: usize,
    /// Width of `/Contents` including its angle brackets
    contents_size: usize,
}

impl PdfSigner {
    /// Create a signer producing `adbe.pkcs7.detached` signatures.
    pub fn new(credentials: SigningCredentials) -> Self {
        Self {
            credentials,
            sub_filter: SignatureSubFilter::default(),
        }
    }

    /// Select the CMS flavour. Must match the `/SubFilter` in the placeholder.
    pub fn with_sub_filter(mut self, sub_filter: SignatureSubFilter) -> Self {
        self.sub_filter = sub_filter;
        self
    }

    /// Get the signing credentials.
    pub fn credentials(&self) -> &SigningCredentials {
        &self.credentials
    }

    /// Sign a document prepared with a placeholder.
    ///
    /// # Errors
    ///
    /// - format error when the document does not end with `%%EOF`
    /// - parse error when the ByteRange placeholder or `/Contents` is missing
    /// - input error when the signature does not fit the placeholder
    pub fn sign(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        let pdf = buffer::strip_trailing_newline(pdf);
        if !pdf.ends_with(b"%%EOF") {
            return Err(Error::Format("document does not end with %%EOF".to_string()));
        }

        let location = locate_placeholder(pdf)?;
        log::debug!(
            "placeholder: ByteRange at {}, Contents at {} ({} bytes)",
            location.byte_range_pos,
            location.contents_pos,
            location.contents_size
        );

        let calc = ByteRangeCalculator::with_placeholder_size(location.contents_size);
        let byte_range = calc.calculate_byte_range(pdf.len(), location.contents_pos);

        let mut output = pdf.to_vec();
        ByteRangeArray::resolve(byte_range)?.copy_bytes_into(&mut output, location.byte_range_pos)?;

        let signed_data = ByteRangeCalculator::extract_signed_bytes(&output, &byte_range)?;
        let signature = build_detached_signature(&self.credentials, &signed_data, self.sub_filter)?;
        calc.insert_signature(&mut output, location.contents_pos, &signature)?;

        log::info!(
            "signed {} bytes: ByteRange {:?}, {} of {} signature bytes used",
            output.len(),
            byte_range,
            signature.len(),
            calc.hex_capacity() / 2
        );
        Ok(output)
    }
}

fn locate_placeholder(pdf: &[u8]) -> Result<PlaceholderLocation> {
    let token = format!("/ByteRange {}", ByteRangeArray::placeholder_text());
    let token_pos = buffer::find(pdf, token.as_bytes())
        .ok_or_else(|| Error::Parse("no ByteRange placeholder found".to_string()))?;
    let byte_range_pos = token_pos + "/ByteRange ".len();

    let contents_pos = ByteRangeCalculator::find_contents_offset(pdf, token_pos + token.len())
        .ok_or_else(|| Error::Parse("no /Contents placeholder after ByteRange".to_string()))?;
    let contents_end = buffer::find_from(pdf, b">", contents_pos)
        .ok_or_else(|| Error::Parse("unterminated /Contents placeholder".to_string()))?;

    Ok(PlaceholderLocation {
        byte_range_pos,
        contents_pos,
        contents_size: contents_end + 1 - contents_pos,
    })
}
