//! PDF object types.
//!
//! Only the subset of the object model needed to rewrite catalog, page and
//! AcroForm dictionaries and to emit signature objects: no streams.
//! Dictionaries keep insertion order so re-emitted objects stay close to the
//! layout they were read with.

use crate::error::{Error, Result};
use indexmap::{Equivalent, IndexMap};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Insertion-ordered PDF dictionary.
///
/// Keys are [`Name`]s but can be looked up with a `&str`, e.g.
/// `dict.get("Type")`.
pub type Dictionary = IndexMap<Name, Object>;

/// A PDF name with its `#XX` escapes decoded.
///
/// Names are byte sequences (ISO 32000-1 §7.3.5), so bytes that are not
/// UTF-8 are kept as-is and written back unchanged.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(Vec<u8>);

impl Name {
    /// Wrap decoded name bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Name(bytes.into())
    }

    /// The decoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as text, `None` when it is not UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

// UTF-8 names hash like the equal `str` so that `&str` lookups work.
impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.as_str() {
            Some(text) => text.hash(state),
            None => self.0.hash(state),
        }
    }
}

impl Equivalent<Name> for str {
    fn equivalent(&self, key: &Name) -> bool {
        self.as_bytes() == key.as_bytes()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.as_bytes().to_vec())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name(s.into_bytes())
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", String::from_utf8_lossy(&self.0))
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "Name({:?})", text),
            None => write!(f, "Name({:02X?})", self.0),
        }
    }
}

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(Name),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl FromStr for ObjectRef {
    type Err = Error;

    /// Parse a reference string such as `"12 0 R"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let id = parts.next().and_then(|p| p.parse::<u32>().ok());
        let gen = parts.next().and_then(|p| p.parse::<u16>().ok());
        let marker = parts.next();
        match (id, gen, marker, parts.next()) {
            (Some(id), Some(gen), Some("R"), None) => Ok(ObjectRef::new(id, gen)),
            _ => Err(Error::Parse(format!("invalid object reference: {:?}", s))),
        }
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to a UTF-8 name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => n.as_str(),
            _ => None,
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a name object.
    pub fn name(s: &str) -> Object {
        Object::Name(Name::from(s))
    }

    /// Build a literal string object from UTF-8 text.
    pub fn string(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}
