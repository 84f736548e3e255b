//! ByteRange calculation for PDF signatures.
//!
//! PDF digital signatures use a ByteRange array to specify which portions
//! of the document are covered by the signature. The signature itself is
//! stored in a placeholder that is excluded from the signed bytes.
//!
//! ## ByteRange Format
//!
//! The ByteRange is an array of four integers:
//! `[offset1, length1, offset2, length2]`
//!
//! Where:
//! - `offset1` = 0 (start of file)
//! - `length1` = byte offset where the signature value begins (its `<`)
//! - `offset2` = byte offset just past the signature value's `>`
//! - `length2` = remaining bytes to end of file

use crate::buffer;
use crate::error::{Error, Result};

/// Calculator for PDF signature byte ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRangeCalculator {
    /// Size of the placeholder for the signature value (hex digits + 2 for angle brackets)
    placeholder_size: usize,
}

impl ByteRangeCalculator {
    /// Create a calculator for a `/Contents` holding `signature_length` bytes.
    ///
    /// The placeholder size is `signature_length * 2 + 2`: hex-encoded and
    /// enclosed in angle brackets.
    pub fn new(signature_length: usize) -> Self {
        Self {
            placeholder_size: signature_length * 2 + 2,
        }
    }

    /// Create a ByteRange calculator with a specific placeholder size.
    pub fn with_placeholder_size(placeholder_size: usize) -> Self {
        Self { placeholder_size }
    }

    /// Get the placeholder size (for the /Contents value, brackets included).
    pub fn placeholder_size(&self) -> usize {
        self.placeholder_size
    }

    /// Number of hex digits the placeholder holds.
    pub fn hex_capacity(&self) -> usize {
        self.placeholder_size.saturating_sub(2)
    }

    /// Calculate the ByteRange array given the position of the /Contents value.
    ///
    /// `contents_offset` is the byte offset of the value's opening `<`.
    pub fn calculate_byte_range(&self, file_size: usize, contents_offset: usize) -> [usize; 4] {
        let after_sig_start = contents_offset + self.placeholder_size;
        [0, contents_offset, after_sig_start, file_size.saturating_sub(after_sig_start)]
    }

    /// Extract the bytes to be signed: the two ranges concatenated.
    pub fn extract_signed_bytes(pdf_data: &[u8], byte_range: &[usize; 4]) -> Result<Vec<u8>> {
        let [offset1, length1, offset2, length2] = *byte_range;

        if offset1 + length1 > pdf_data.len() {
            return Err(Error::Parse(format!(
                "ByteRange first range exceeds file size: {} + {} > {}",
                offset1,
                length1,
                pdf_data.len()
            )));
        }
        if offset2 + length2 > pdf_data.len() {
            return Err(Error::Parse(format!(
                "ByteRange second range exceeds file size: {} + {} > {}",
                offset2,
                length2,
                pdf_data.len()
            )));
        }

        let mut signed_bytes = Vec::with_capacity(length1 + length2);
        signed_bytes.extend_from_slice(&pdf_data[offset1..offset1 + length1]);
        signed_bytes.extend_from_slice(&pdf_data[offset2..offset2 + length2]);
        Ok(signed_bytes)
    }

    /// Check that a ByteRange covers the entire document except the signature.
    ///
    /// The first range must start at 0, the second must end at the file size,
    /// and the first must end before the second starts.
    pub fn validate_byte_range(byte_range: &[usize; 4], file_size: usize) -> Result<()> {
        let [offset1, length1, offset2, length2] = *byte_range;

        if offset1 != 0 {
            return Err(Error::Parse(format!("ByteRange must start at 0, got {}", offset1)));
        }

        let actual_end = offset2 + length2;
        if actual_end != file_size {
            return Err(Error::Parse(format!(
                "ByteRange must end at file size {}, got {}",
                file_size, actual_end
            )));
        }

        if length1 > offset2 {
            return Err(Error::Parse(format!(
                "ByteRange first range ({}) overlaps with second range start ({})",
                length1, offset2
            )));
        }

        Ok(())
    }

    /// Find the `<` that opens the /Contents value following `from`.
    pub fn find_contents_offset(pdf_data: &[u8], from: usize) -> Option<usize> {
        let contents = buffer::find_from(pdf_data, b"/Contents", from)?;
        let value = buffer::skip_whitespace(pdf_data, contents + b"/Contents".len());
        (pdf_data.get(value) == Some(&b'<')).then_some(value)
    }

    /// Replace the placeholder at `contents_offset` with `signature` hex-encoded.
    ///
    /// The hex is lowercase and right-padded with `0` to fill the placeholder.
    ///
    /// # Errors
    ///
    /// Returns an input error when the signature does not fit.
    pub fn insert_signature(&self, pdf_data: &mut [u8], contents_offset: usize, signature: &[u8]) -> Result<()> {
        let signature_hex = hex::encode(signature);
        if signature_hex.len() > self.hex_capacity() {
            return Err(Error::Input(format!(
                "signature exceeds placeholder capacity: {} hex digits needed, {} available",
                signature_hex.len(),
                self.hex_capacity()
            )));
        }

        if contents_offset + self.placeholder_size > pdf_data.len() {
            return Err(Error::Input("signature insertion would exceed file bounds".to_string()));
        }

        let mut sig_value = String::with_capacity(self.placeholder_size);
        sig_value.push('<');
        sig_value.push_str(&signature_hex);
        sig_value.push_str(&"0".repeat(self.hex_capacity() - signature_hex.len()));
        sig_value.push('>');

        pdf_data[contents_offset..contents_offset + self.placeholder_size].copy_from_slice(sig_value.as_bytes());
        Ok(())
    }
}

impl Default for ByteRangeCalculator {
    fn default() -> Self {
        Self::new(crate::signatures::types::DEFAULT_SIGNATURE_LENGTH)
    }
}
