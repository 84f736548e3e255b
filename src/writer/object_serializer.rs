//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! ISO 32000-1:2008 §7.3. Dictionaries are written in insertion order, which
//! the signature dictionary relies on: `/ByteRange` must precede `/Contents`.

use crate::object::{Dictionary, Name, Object, ObjectRef};

/// Smallest whole `f64` that no longer fits an `i64` token.
const MAX_INTEGRAL_REAL: f64 = 9_223_372_036_854_775_808.0;

/// Serializer for PDF objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Whether to use compact formatting (minimal whitespace)
    compact: bool,
}

impl ObjectSerializer {
    /// Create a new object serializer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact serializer (minimal whitespace).
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj);
        buf
    }

    /// Serialize an object to a string (for logging and tests).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).into_owned()
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} {gen} obj\n{object}\nendobj\n`
    pub fn serialize_indirect(&self, r: ObjectRef, obj: &Object) -> Vec<u8> {
        let mut buf = format!("{} {} obj\n", r.id, r.gen).into_bytes();
        self.write_object(&mut buf, obj);
        buf.extend_from_slice(b"\nendobj\n");
        buf
    }

    fn write_object(&self, w: &mut Vec<u8>, obj: &Object) {
        match obj {
            Object::Null => w.extend_from_slice(b"null"),
            Object::Boolean(b) => w.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => w.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => self.write_real(w, *r),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n.as_bytes()),
            Object::Array(arr) => self.write_array(w, arr),
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Reference(r) => w.extend_from_slice(r.to_string().as_bytes()),
        }
    }

    /// Write a real number in the shortest decimal form that reads back to
    /// the same `f64`. PDF has no exponent syntax, and `f64`'s `Display`
    /// never emits one.
    fn write_real(&self, w: &mut Vec<u8>, value: f64) {
        if !value.is_finite() {
            log::warn!("non-finite real {} written as 0", value);
            w.push(b'0');
            return;
        }
        let mut formatted = if value == 0.0 { "0".to_string() } else { value.to_string() };
        // Whole values past the i64 range must stay reals on re-read.
        if value.abs() >= MAX_INTEGRAL_REAL && !formatted.contains('.') {
            formatted.push_str(".0");
        }
        w.extend_from_slice(formatted.as_bytes());
    }

    /// Write a PDF string: literal `(...)` when printable, hex `<...>` otherwise.
    fn write_string(&self, w: &mut Vec<u8>, data: &[u8]) {
        let is_printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

        if is_printable {
            w.push(b'(');
            for &byte in data {
                match byte {
                    b'(' => w.extend_from_slice(b"\\("),
                    b')' => w.extend_from_slice(b"\\)"),
                    b'\\' => w.extend_from_slice(b"\\\\"),
                    b'\n' => w.extend_from_slice(b"\\n"),
                    b'\r' => w.extend_from_slice(b"\\r"),
                    b'\t' => w.extend_from_slice(b"\\t"),
                    _ => w.push(byte),
                }
            }
            w.push(b')');
        } else {
            w.push(b'<');
            w.extend_from_slice(hex::encode_upper(data).as_bytes());
            w.push(b'>');
        }
    }

    /// Write a PDF name, escaping delimiters, whitespace, `#` and non-ASCII
    /// bytes as `#xx`.
    fn write_name(&self, w: &mut Vec<u8>, name: &[u8]) {
        w.push(b'/');
        for &byte in name {
            match byte {
                b'!'..=b'~'
                    if !matches!(
                        byte,
                        b'#' | b'%' | b'(' | b')' | b'/' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
                    ) =>
                {
                    w.push(byte)
                },
                _ => w.extend_from_slice(format!("#{:02X}", byte).as_bytes()),
            }
        }
    }

    fn write_array(&self, w: &mut Vec<u8>, arr: &[Object]) {
        w.push(b'[');
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                w.push(b' ');
            }
            self.write_object(w, obj);
        }
        w.push(b']');
    }

    fn write_dictionary(&self, w: &mut Vec<u8>, dict: &Dictionary) {
        w.extend_from_slice(b"<<");
        for (key, value) in dict {
            w.extend_from_slice(if self.compact { b" " } else { b"\n  " });
            self.write_name(w, key.as_bytes());
            w.push(b' ');
            self.write_object(w, value);
        }
        if !dict.is_empty() {
            w.extend_from_slice(if self.compact { b" " } else { b"\n" });
        }
        w.extend_from_slice(b">>");
    }
}

/// Helper functions for building PDF objects.
impl ObjectSerializer {
    /// Create a Dictionary object from ordered entries.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (Name::from(k), v)).collect())
    }

    /// Create a text string: PDFDocEncoding-compatible ASCII as-is, otherwise
    /// UTF-16BE with a byte order mark.
    pub fn text(s: &str) -> Object {
        if s.is_ascii() {
            return Object::String(s.as_bytes().to_vec());
        }
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes)
    }

    /// Create a rectangle array `[llx lly urx ury]`.
    pub fn rect(rect: [f64; 4]) -> Object {
        Object::Array(rect.iter().map(|v| Object::Real(*v)).collect())
    }
}
