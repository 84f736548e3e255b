//! PDF object parser.
//!
//! Recursive descent over lexer tokens: read a token, and for arrays and
//! dictionaries recurse into their contents. Streams are never parsed; the
//! objects rewritten during signing (catalog, page, AcroForm) are plain
//! dictionaries.
//!
//! Parsing is strict: an unclosed array or dictionary is an error, since a
//! truncated object re-emitted into an incremental update would silently
//! drop entries.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dictionary, Object, ObjectRef};
use nom::IResult;

/// Decode escape sequences in PDF literal strings (ISO 32000-1 §7.3.4.2).
///
/// Handles `\n \r \t \b \f \( \) \\`, octal `\ddd` (1-3 digits) and line
/// continuations. Unknown escapes keep the backslash.
///
/// # Examples
///
/// ```
/// # use pdf_sigil::parser::decode_literal_string_escapes;
/// assert_eq!(decode_literal_string_escapes(b"Signer \\(CN\\)"), b"Signer (CN)");
/// ```
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }

        match raw[i + 1] {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(8),
            b'f' => result.push(12),
            b'(' | b')' | b'\\' => result.push(raw[i + 1]),
            b'\n' => {},
            b'\r' => {
                if i + 2 < raw.len() && raw[i + 2] == b'\n' {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let start = i + 1;
                let mut octal_value = 0u32;
                let mut octal_len = 0;
                while octal_len < 3
                    && start + octal_len < raw.len()
                    && (b'0'..=b'7').contains(&raw[start + octal_len])
                {
                    octal_value = octal_value * 8 + (raw[start + octal_len] - b'0') as u32;
                    octal_len += 1;
                }
                result.push((octal_value & 0xFF) as u8);
                i += 1 + octal_len;
                continue;
            },
            _ => {
                result.push(b'\\');
                i += 1;
                continue;
            },
        }
        i += 2;
    }

    result
}

/// Decode a hex string body to bytes.
///
/// Whitespace is ignored; an odd trailing digit is padded with 0.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut digits: Vec<u8> = hex_bytes
        .iter()
        .filter(|c| !c.is_ascii_whitespace())
        .copied()
        .collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    hex::decode(&digits).map_err(|e| Error::Parse(format!("invalid hex string: {}", e)))
}

/// Parse a PDF object from input bytes.
///
/// Handles null, booleans, numbers, strings, names, arrays, dictionaries and
/// indirect references (`10 0 R`).
///
/// ```
/// use pdf_sigil::parser::parse_object;
///
/// let (_, obj) = parse_object(b"<< /Type /Page /Parent 2 0 R >>").unwrap();
/// assert!(obj.as_dict().is_some());
/// ```
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),

        Token::Integer(i) => {
            // Either a plain integer or the start of `id gen R`
            if let Ok((after_gen, Token::Integer(gen))) = token(input) {
                if let Ok((after_r, Token::R)) = token(after_gen) {
                    if let (Ok(id), Ok(gen)) = (u32::try_from(i), u16::try_from(gen)) {
                        return Ok((after_r, Object::Reference(ObjectRef::new(id, gen))));
                    }
                }
            }
            Ok((input, Object::Integer(i)))
        },

        Token::Real(r) => Ok((input, Object::Real(r))),

        Token::LiteralString(bytes) => Ok((input, Object::String(decode_literal_string_escapes(bytes)))),

        Token::HexString(hex_bytes) => match decode_hex(hex_bytes) {
            Ok(decoded) => Ok((input, Object::String(decoded))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Fail))),
        },

        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::ArrayStart => parse_array(input),

        Token::DictStart => {
            let (input, dict) = parse_dictionary_entries(input, true)?;
            Ok((input, Object::Dictionary(dict)))
        },

        _ => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

/// Parse a PDF array body after `[`.
fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        let (after, tok) = token(remaining)?;
        if tok == Token::ArrayEnd {
            return Ok((after, Object::Array(objects)));
        }
        let (after, obj) = parse_object(remaining)?;
        objects.push(obj);
        remaining = after;
    }
}

/// Parse `/Key value` pairs.
///
/// With `closed` the entries must be terminated by `>>`; otherwise they run
/// to the end of input.
fn parse_dictionary_entries(input: &[u8], closed: bool) -> IResult<&[u8], Dictionary> {
    let mut dict = Dictionary::new();
    let mut remaining = input;

    loop {
        if !closed {
            let (rest, _) = crate::lexer::skip_ws(remaining)?;
            if rest.is_empty() {
                return Ok((rest, dict));
            }
        }

        let (after, tok) = token(remaining)?;
        match tok {
            Token::DictEnd if closed => return Ok((after, dict)),
            Token::Name(key) => {
                let (after, value) = parse_object(after)?;
                dict.insert(key, value);
                remaining = after;
            },
            _ => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Tag,
                )))
            },
        }
    }
}

fn offset_of(full: &[u8], rest: &[u8]) -> usize {
    full.len().saturating_sub(rest.len())
}

fn parse_failure(full: &[u8], err: nom::Err<nom::error::Error<&[u8]>>) -> Error {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => Error::ParseAt {
            offset: offset_of(full, e.input),
            reason: format!("unexpected input ({:?})", e.code),
        },
        nom::Err::Incomplete(_) => Error::Parse("unexpected end of object".to_string()),
    }
}

/// Parse a complete value from text, e.g. an object body or a trailer.
pub fn parse_value(text: &[u8]) -> Result<Object> {
    parse_object(text)
        .map(|(_, obj)| obj)
        .map_err(|e| parse_failure(text, e))
}

/// Parse the inside of a dictionary, without its `<<` `>>` delimiters.
pub fn parse_dictionary_inner(text: &[u8]) -> Result<Dictionary> {
    parse_dictionary_entries(text, false)
        .map(|(_, dict)| dict)
        .map_err(|e| parse_failure(text, e))
}
