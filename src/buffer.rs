//! Byte buffer search and slice helpers.
//!
//! The signing pipeline never tokenizes a whole PDF. It locates markers
//! (`trailer`, `startxref`, `/ByteRange [`, `endobj`) by plain byte search
//! and slices around them, so these helpers are shared by every stage.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BRACKETED_TUPLE: Regex = Regex::new(r"\[([^\[\]]*)\]").unwrap();
    static ref INTEGER: Regex = Regex::new(r"-?\d+").unwrap();
}

/// Find the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    find_from(haystack, needle, 0)
}

/// Find the first occurrence of `needle` at or after `from`.
pub fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Find the last occurrence of `needle` in `haystack`.
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    rfind_before(haystack, needle, haystack.len())
}

/// Find the last occurrence of `needle` that ends at or before `end`.
pub fn rfind_before(haystack: &[u8], needle: &[u8], end: usize) -> Option<usize> {
    let end = end.min(haystack.len());
    if needle.is_empty() || needle.len() > end {
        return None;
    }
    haystack[..end].windows(needle.len()).rposition(|w| w == needle)
}

/// Find the `n`th (1-based) occurrence of `needle`.
pub fn find_nth(haystack: &[u8], needle: &[u8], n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let mut from = 0;
    let mut seen = 0;
    while let Some(pos) = find_from(haystack, needle, from) {
        seen += 1;
        if seen == n {
            return Some(pos);
        }
        from = pos + needle.len();
    }
    None
}

/// Count non-overlapping occurrences of `needle`.
pub fn count(haystack: &[u8], needle: &[u8]) -> usize {
    let mut from = 0;
    let mut total = 0;
    while let Some(pos) = find_from(haystack, needle, from) {
        total += 1;
        from = pos + needle.len();
    }
    total
}

/// Parse the integers inside the first `[...]` group of `text`.
///
/// `"/ByteRange [0 840 960 240 ]"` yields `[0, 840, 960, 240]`. Returns
/// `None` when no bracketed group exists.
pub fn parse_bracketed_integers(text: &str) -> Option<Vec<i64>> {
    let inner = BRACKETED_TUPLE.captures(text)?.get(1)?.as_str();
    INTEGER
        .find_iter(inner)
        .map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

/// Drop a single trailing `\n` and then a single trailing `\r`.
pub fn strip_trailing_newline(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && data[end - 1] == b'\r' {
        end -= 1;
    }
    &data[..end]
}

/// Whether `b` is PDF whitespace (ISO 32000-1 Table 1).
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

/// Skip PDF whitespace starting at `pos`, returning the first non-whitespace index.
pub fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && is_whitespace(data[pos]) {
        pos += 1;
    }
    pos
}
