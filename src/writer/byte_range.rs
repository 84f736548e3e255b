//! Length-stable rendering of the `/ByteRange` array.
//!
//! The signature dictionary is written before the final offsets are known,
//! so `/ByteRange` starts as a fixed-width placeholder. Once the offsets are
//! computed the real array is written over it, right-padded with spaces so
//! that no byte after it moves.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::writer::ObjectSerializer;

/// Name used for the three unknown ByteRange slots.
pub const BYTE_RANGE_SLOT: &str = "**********";

/// A value whose serialized width can be reserved up front and later
/// overwritten in place.
pub trait LengthStable {
    /// Serialized width in bytes.
    fn size_in_bytes(&self) -> usize;

    /// Write the serialized form into `buffer` at `offset`, returning the
    /// number of bytes written.
    fn copy_bytes_into(&self, buffer: &mut [u8], offset: usize) -> Result<usize>;
}

/// The `/ByteRange` value, either still reserved or resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRangeArray {
    /// `[0 /********** /********** /**********]`
    Placeholder,
    /// `[0 len1 start2 len2]` padded to the placeholder width
    Resolved([usize; 4]),
}

impl ByteRangeArray {
    /// The PDF object written into the signature dictionary.
    pub fn placeholder_object() -> Object {
        let slot = Object::name(BYTE_RANGE_SLOT);
        Object::Array(vec![Object::Integer(0), slot.clone(), slot.clone(), slot])
    }

    /// Serialized placeholder text, exactly as the serializer emits it.
    pub fn placeholder_text() -> String {
        ObjectSerializer::new().serialize_to_string(&Self::placeholder_object())
    }

    /// Resolve to concrete offsets.
    ///
    /// # Errors
    ///
    /// Returns an input error when the rendered array would be wider than the
    /// placeholder it replaces.
    pub fn resolve(range: [usize; 4]) -> Result<Self> {
        let resolved = ByteRangeArray::Resolved(range);
        let needed = resolved.unpadded().len();
        let available = Self::placeholder_text().len();
        if needed > available {
            return Err(Error::Input(format!(
                "ByteRange {:?} needs {} bytes but the placeholder holds {}",
                range, needed, available
            )));
        }
        Ok(resolved)
    }

    fn unpadded(&self) -> String {
        match self {
            ByteRangeArray::Placeholder => Self::placeholder_text(),
            ByteRangeArray::Resolved(r) => format!("[{} {} {} {}]", r[0], r[1], r[2], r[3]),
        }
    }

    /// Rendered text, always exactly as wide as the placeholder.
    pub fn render(&self) -> String {
        let width = Self::placeholder_text().len();
        format!("{:<width$}", self.unpadded(), width = width)
    }
}

impl LengthStable for ByteRangeArray {
    fn size_in_bytes(&self) -> usize {
        Self::placeholder_text().len()
    }

    fn copy_bytes_into(&self, buffer: &mut [u8], offset: usize) -> Result<usize> {
        let rendered = self.render();
        let end = offset + rendered.len();
        if end > buffer.len() {
            return Err(Error::Input(format!(
                "ByteRange at {} overruns buffer of {} bytes",
                offset,
                buffer.len()
            )));
        }
        buffer[offset..end].copy_from_slice(rendered.as_bytes());
        Ok(rendered.len())
    }
}
