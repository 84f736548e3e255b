//! Locate an embedded signature in a signed document.
//!
//! Signatures are found textually by their `/ByteRange [` token, so the
//! document does not need to be parsed. Occurrences are numbered from 1 in
//! file order; in an incrementally re-signed file the newest signature comes
//! last.

use super::byterange::ByteRangeCalculator;
use crate::buffer;
use crate::error::{Error, Result};

const BYTE_RANGE_TOKEN: &[u8] = b"/ByteRange [";

/// A signature lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSignature {
    /// `[0, len1, start2, len2]` as written in the document
    pub byte_range: [usize; 4],
    /// DER-encoded CMS `ContentInfo`, padding removed
    pub signature: Vec<u8>,
    /// The bytes covered by the ByteRange
    pub signed_data: Vec<u8>,
}

/// Number of ByteRange entries in the document, placeholders included.
pub fn count_signatures(pdf: &[u8]) -> usize {
    buffer::count(pdf, BYTE_RANGE_TOKEN)
}

/// Extract the `occurrence`th (1-based) signature.
///
/// # Errors
///
/// Returns a parse error when there is no such occurrence, the ByteRange is
/// malformed or still a placeholder, or the `/Contents` hex is not valid.
pub fn extract_signature(pdf: &[u8], occurrence: usize) -> Result<ExtractedSignature> {
    let pos = buffer::find_nth(pdf, BYTE_RANGE_TOKEN, occurrence)
        .ok_or_else(|| Error::Parse(format!("no signature occurrence {}", occurrence)))?;
    let end = buffer::find_from(pdf, b"]", pos)
        .ok_or_else(|| Error::Parse("unterminated ByteRange".to_string()))?;
    let text = std::str::from_utf8(&pdf[pos..=end])?;

    let values = buffer::parse_bracketed_integers(text)
        .ok_or_else(|| Error::Parse(format!("ByteRange is not resolved: {}", text.trim())))?;
    let byte_range = to_byte_range(&values)
        .ok_or_else(|| Error::Parse(format!("ByteRange must hold four offsets: {}", text.trim())))?;

    let signed_data = ByteRangeCalculator::extract_signed_bytes(pdf, &byte_range)?;

    let [_, len1, start2, _] = byte_range;
    if len1 + 2 > start2 || start2 > pdf.len() {
        return Err(Error::Parse(format!("ByteRange {:?} leaves no room for /Contents", byte_range)));
    }
    let hex_text = &pdf[len1 + 1..start2 - 1];
    let decoded =
        hex::decode(hex_text).map_err(|e| Error::Parse(format!("invalid /Contents hex: {}", e)))?;
    let signature = trim_padding(decoded);

    log::debug!(
        "extracted signature {}: ByteRange {:?}, {} DER bytes",
        occurrence,
        byte_range,
        signature.len()
    );
    Ok(ExtractedSignature {
        byte_range,
        signature,
        signed_data,
    })
}

fn to_byte_range(values: &[i64]) -> Option<[usize; 4]> {
    if values.len() != 4 {
        return None;
    }
    let mut range = [0usize; 4];
    for (slot, value) in range.iter_mut().zip(values) {
        *slot = usize::try_from(*value).ok()?;
    }
    Some(range)
}

/// Drop the zero padding after the DER value.
///
/// The outer DER length says exactly where the signature ends; when it
/// cannot be read, trailing zero bytes are stripped instead.
fn trim_padding(mut decoded: Vec<u8>) -> Vec<u8> {
    match der_total_length(&decoded) {
        Some(len) if len <= decoded.len() => decoded.truncate(len),
        _ => {
            let keep = decoded.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            decoded.truncate(keep);
        },
    }
    decoded
}

/// Length of the leading DER SEQUENCE, header included.
fn der_total_length(data: &[u8]) -> Option<usize> {
    if data.first() != Some(&0x30) {
        return None;
    }
    let first = *data.get(1)?;
    if first & 0x80 == 0 {
        return Some(2 + first as usize);
    }
    let count = (first & 0x7F) as usize;
    if count == 0 || count > std::mem::size_of::<usize>() {
        return None;
    }
    let length = data
        .get(2..2 + count)?
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    (2 + count).checked_add(length)
}
