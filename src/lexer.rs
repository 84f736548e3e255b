//! PDF lexer (tokenizer).
//!
//! Low-level nom parsers over PDF bytes: the generic object tokens used by
//! [`crate::parser`], plus the fixed-layout pieces of a classic
//! cross-reference section (subsection headers and 20-byte rows) and
//! `N G obj` headers.
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped
//! before every token.

use crate::object::Name;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit1, one_of, space1},
    combinator::{map, map_res, opt, value},
    sequence::{delimited, preceded},
    IResult,
};
use std::str::FromStr;

/// Token types recognized by the lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),
    /// Real (floating-point) number (e.g., 3.14, -2.5, .5)
    Real(f64),
    /// Raw literal string bytes, escapes not yet decoded
    LiteralString(&'a [u8]),
    /// Raw hexadecimal string bytes, whitespace preserved
    HexString(&'a [u8]),
    /// Name with `#XX` escapes decoded
    Name(Name),
    /// Boolean true keyword
    True,
    /// Boolean false keyword
    False,
    /// Null keyword
    Null,
    /// Array start delimiter [
    ArrayStart,
    /// Array end delimiter ]
    ArrayEnd,
    /// Dictionary start delimiter <<
    DictStart,
    /// Dictionary end delimiter >>
    DictEnd,
    /// Indirect object start keyword "obj"
    ObjStart,
    /// Indirect object end keyword "endobj"
    ObjEnd,
    /// Reference keyword "R" (used in "10 0 R")
    R,
}

fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(c: u8) -> bool {
    matches!(c, b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}')
}

/// Skip all whitespace and comments.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], ()> {
    let mut remaining = input;
    loop {
        let (rest, ws) = take_while(is_pdf_whitespace)(remaining)?;
        remaining = rest;
        if let Ok((rest, _)) =
            preceded(char::<&[u8], nom::error::Error<&[u8]>>('%'), take_till(|c| c == b'\r' || c == b'\n'))(
                remaining,
            )
        {
            remaining = rest;
            continue;
        }
        if ws.is_empty() {
            break;
        }
    }
    Ok((remaining, ()))
}

/// Unsigned decimal number of any `FromStr` type.
fn unsigned<T: FromStr>(input: &[u8]) -> IResult<&[u8], T> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<T>().map_err(|_| ()))
    })(input)
}

/// Parse an integer or real number.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let start = input;
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    if int_part.is_none() && frac_part.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(start, nom::error::ErrorKind::Digit)));
    }

    let digits = |bytes: &[u8]| std::str::from_utf8(bytes).unwrap_or("0").to_string();
    let negative = sign == Some('-');

    if let Some(frac) = frac_part {
        let text = format!(
            "{}{}.{}",
            if negative { "-" } else { "" },
            int_part.map(digits).unwrap_or_else(|| "0".to_string()),
            frac.map(digits).unwrap_or_else(|| "0".to_string())
        );
        let num: f64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(start, nom::error::ErrorKind::Float))
        })?;
        Ok((input, Token::Real(num)))
    } else {
        let sign = if negative { "-" } else { "" };
        let text = format!("{}{}", sign, int_part.map(digits).unwrap_or_default());
        if let Ok(num) = text.parse::<i64>() {
            return Ok((input, Token::Integer(num)));
        }
        // Out of i64 range: keep the magnitude as a real.
        let num: f64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(start, nom::error::ErrorKind::Digit))
        })?;
        Ok((input, Token::Real(num)))
    }
}

/// Parse a literal string enclosed in balanced parentheses.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (remaining, _) = char('(')(input)?;
    let mut depth = 1;
    let mut pos = 0;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 || pos > remaining.len() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    Ok((&remaining[pos..], Token::LiteralString(&remaining[..pos - 1])))
}

/// Parse a hexadecimal string enclosed in angle brackets.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_pdf_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode `#XX` escape sequences in PDF names (ISO 32000-1 §7.3.5).
///
/// The result is raw bytes; names are not required to be UTF-8.
pub fn decode_name_escapes(name: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len());
    let mut i = 0;
    while i < name.len() {
        if name[i] == b'#' && i + 2 < name.len() {
            let decoded = std::str::from_utf8(&name[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(name[i]);
        i += 1;
    }
    out
}

/// Parse a name starting with /.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| !is_pdf_whitespace(c) && !is_delimiter(c)),
            |bytes: &[u8]| Token::Name(Name::new(decode_name_escapes(bytes))),
        ),
    )(input)
}

/// Parse PDF keywords and delimiters. Longer keywords are tried first.
fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::False, tag(b"false")),
        value(Token::True, tag(b"true")),
        value(Token::Null, tag(b"null")),
        value(Token::ObjEnd, tag(b"endobj")),
        value(Token::ObjStart, tag(b"obj")),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::R, tag(b"R")),
    ))(input)
}

/// Parse a single PDF token after skipping whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;
    alt((parse_keyword, parse_name, parse_number, parse_literal_string, parse_hex_string))(input)
}

/// Parse an indirect object header: `12 0 obj`.
pub fn object_header(input: &[u8]) -> IResult<&[u8], (u32, u16)> {
    let (input, _) = skip_ws(input)?;
    let (input, id) = unsigned::<u32>(input)?;
    let (input, _) = space1(input)?;
    let (input, gen) = unsigned::<u16>(input)?;
    let (input, _) = skip_ws(input)?;
    let (input, _) = tag(b"obj")(input)?;
    Ok((input, (id, gen)))
}

/// Parse a cross-reference subsection header: `<first id> <count>`.
pub fn xref_subsection_header(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    let (input, _) = skip_ws(input)?;
    let (input, first) = unsigned::<u32>(input)?;
    let (input, _) = space1(input)?;
    let (input, count) = unsigned::<u32>(input)?;
    Ok((input, (first, count)))
}

/// Parse one cross-reference row: `<10-digit offset> <5-digit gen> <f|n>`.
///
/// Returns `(offset, generation, in_use)`.
pub fn xref_entry(input: &[u8]) -> IResult<&[u8], (u64, u16, bool)> {
    let (input, _) = skip_ws(input)?;
    let (input, offset) = unsigned::<u64>(input)?;
    let (input, _) = space1(input)?;
    let (input, generation) = unsigned::<u16>(input)?;
    let (input, _) = space1(input)?;
    let (input, kind) = one_of("fn")(input)?;
    Ok((input, (offset, generation, kind == 'n')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_and_reals() {
        assert_eq!(token(b"42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"-123"), Ok((&b""[..], Token::Integer(-123))));
        assert_eq!(token(b"-2.5"), Ok((&b""[..], Token::Real(-2.5))));
        assert_eq!(token(b".5"), Ok((&b""[..], Token::Real(0.5))));
        assert_eq!(token(b"612.0"), Ok((&b""[..], Token::Real(612.0))));
        assert_eq!(token(b"+7"), Ok((&b""[..], Token::Integer(7))));
    }

    #[test]
    fn test_integer_overflow_becomes_real() {
        assert_eq!(
            token(b"9223372036854775807"),
            Ok((&b""[..], Token::Integer(i64::MAX)))
        );
        assert_eq!(
            token(b"9223372036854775808"),
            Ok((&b""[..], Token::Real(9_223_372_036_854_775_808.0)))
        );
        assert_eq!(token(b"-9223372036854775808"), Ok((&b""[..], Token::Integer(i64::MIN))));
    }

    #[test]
    fn test_names() {
        assert_eq!(token(b"/Type"), Ok((&b""[..], Token::Name("Type".into()))));
        assert_eq!(token(b"/A#20B /C"), Ok((&b" /C"[..], Token::Name("A B".into()))));
        assert_eq!(token(b"/**********]"), Ok((&b"]"[..], Token::Name("**********".into()))));
        assert_eq!(token(b"/F#E9 4"), Ok((&b" 4"[..], Token::Name(Name::new(vec![b'F', 0xE9])))));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            token(b"(Hello (nested) \\) world)"),
            Ok((&b""[..], Token::LiteralString(&b"Hello (nested) \\) world"[..])))
        );
        assert_eq!(token(b"<00FF>"), Ok((&b""[..], Token::HexString(&b"00FF"[..]))));
        assert!(token(b"(unbalanced").is_err());
    }

    #[test]
    fn test_keywords_and_comments() {
        assert_eq!(token(b"  % note\n<<"), Ok((&b""[..], Token::DictStart)));
        assert_eq!(token(b"endobj"), Ok((&b""[..], Token::ObjEnd)));
        assert_eq!(token(b"obj"), Ok((&b""[..], Token::ObjStart)));
        assert_eq!(token(b"R"), Ok((&b""[..], Token::R)));
        assert_eq!(token(b"true"), Ok((&b""[..], Token::True)));
    }

    #[test]
    fn test_object_header() {
        assert_eq!(object_header(b"\n12 0 obj\n<<"), Ok((&b"\n<<"[..], (12, 0))));
        assert!(object_header(b"12 obj").is_err());
    }

    #[test]
    fn test_xref_subsection_header() {
        assert_eq!(xref_subsection_header(b"0 6\n"), Ok((&b"\n"[..], (0, 6))));
        assert!(xref_subsection_header(b"zero 6").is_err());
    }

    #[test]
    fn test_xref_entry() {
        assert_eq!(
            xref_entry(b"0000000018 00000 n \n"),
            Ok((&b" \n"[..], (18, 0, true)))
        );
        assert_eq!(
            xref_entry(b"\r\n0000000000 65535 f\r\n"),
            Ok((&b"\r\n"[..], (0, 65535, false)))
        );
        assert!(xref_entry(b"00000000x8 00000 n").is_err());
    }

    #[test]
    fn test_decode_name_escapes() {
        assert_eq!(decode_name_escapes(b"A#20B#23C"), b"A B#C");
        assert_eq!(decode_name_escapes(b"Type"), b"Type");
        assert_eq!(decode_name_escapes(b"A#"), b"A#");
        assert_eq!(decode_name_escapes(b"A#2"), b"A#2");
        assert_eq!(decode_name_escapes(b"F#E9"), vec![b'F', 0xE9]);
        assert_eq!(decode_name_escapes(b"A#ZZ"), b"A#ZZ");
    }
}
