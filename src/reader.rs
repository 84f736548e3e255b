//! Read-only view of an existing PDF's structure.
//!
//! Just enough of the document is understood to append a signature: the
//! latest trailer, the merged cross-reference table, and lookups for the
//! catalog, the first page and the AcroForm. Objects are located by offset
//! and sliced out of the buffer; nothing is loaded eagerly.

use crate::buffer;
use crate::error::{Error, Result};
use crate::lexer::object_header;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::parser::{parse_dictionary_inner, parse_value};
use crate::xref::{parse_xref_chain, CrossRefTable};
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref OBJECT_HEADER_TAIL: Regex = Regex::new(r"(\d+)\s+(\d+)\s*$").unwrap();
}

/// Maximum depth when descending a page tree.
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// The fields of the most recent trailer that the signer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// `/Root` catalog reference
    pub root: ObjectRef,
    /// `/Info` reference, if present
    pub info: Option<ObjectRef>,
    /// `/Size` (one greater than the highest object number)
    pub size: u32,
    /// `/ID` array, carried over into updates
    pub id: Option<Object>,
}

/// Structural summary of a PDF buffer.
#[derive(Debug, Clone)]
pub struct PdfStructure {
    /// Latest trailer
    pub trailer: Trailer,
    /// Byte offset of the last `trailer` keyword
    pub trailer_start: usize,
    /// Value of the last `startxref`
    pub xref_position: u64,
    /// All sections merged, newest entries winning
    pub xref: CrossRefTable,
}

/// The AcroForm currently attached to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct AcroForm {
    /// Indirect object holding the form, `None` when inlined in the catalog
    pub object_ref: Option<ObjectRef>,
    /// Whether the catalog's `/AcroForm` entry leads here; `false` when the
    /// form was only found by scanning
    pub linked_from_catalog: bool,
    /// The form dictionary
    pub dict: Dictionary,
    /// References from `/Fields`
    pub fields: Vec<ObjectRef>,
}

/// Read the trailer and cross-reference chain of `data`.
///
/// # Errors
///
/// Fails with a parse error when there is no `trailer` keyword, no
/// `startxref` after it, no `/Root` or `/Size`, or when the xref chain is
/// malformed.
pub fn read_pdf(data: &[u8]) -> Result<PdfStructure> {
    let trailer_start = buffer::rfind(data, b"trailer")
        .ok_or_else(|| Error::Parse("no trailer found".to_string()))?;
    let startxref = buffer::find_from(data, b"startxref", trailer_start)
        .ok_or_else(|| Error::Parse("no startxref after trailer".to_string()))?;

    let trailer_dict = match parse_value(&data[trailer_start + b"trailer".len()..startxref])? {
        Object::Dictionary(dict) => dict,
        other => {
            return Err(Error::ParseAt {
                offset: trailer_start,
                reason: format!("trailer is a {}", other.type_name()),
            })
        },
    };
    let trailer = read_trailer(&trailer_dict)?;

    let xref_position = parse_startxref(&data[startxref + b"startxref".len()..])?;
    let xref = parse_xref_chain(data, xref_position)?;
    log::debug!(
        "read trailer at {}: root {}, size {}, {} xref entries",
        trailer_start,
        trailer.root,
        trailer.size,
        xref.len()
    );

    Ok(PdfStructure {
        trailer,
        trailer_start,
        xref_position,
        xref,
    })
}

fn read_trailer(dict: &Dictionary) -> Result<Trailer> {
    let root = dict
        .get("Root")
        .and_then(Object::as_reference)
        .ok_or_else(|| Error::Parse("trailer has no /Root reference".to_string()))?;
    let size = dict
        .get("Size")
        .and_then(Object::as_integer)
        .and_then(|s| u32::try_from(s).ok())
        .ok_or_else(|| Error::Parse("trailer has no valid /Size".to_string()))?;
    Ok(Trailer {
        root,
        info: dict.get("Info").and_then(Object::as_reference),
        size,
        id: dict.get("ID").cloned(),
    })
}

fn parse_startxref(text: &[u8]) -> Result<u64> {
    let start = buffer::skip_whitespace(text, 0);
    let end = text[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(text.len(), |p| start + p);
    std::str::from_utf8(&text[start..end])?
        .parse::<u64>()
        .map_err(|_| Error::Parse("startxref is not followed by an offset".to_string()))
}

/// Slice of the object `r` between its `obj` header and `endobj`.
pub fn find_object_body<'a>(data: &'a [u8], xref: &CrossRefTable, r: ObjectRef) -> Result<&'a [u8]> {
    let entry = xref
        .get(r.id)
        .filter(|e| e.in_use)
        .ok_or(Error::ObjectNotFound(r.id, r.gen))?;
    let start = usize::try_from(entry.offset)
        .ok()
        .filter(|&o| o < data.len())
        .ok_or(Error::ObjectNotFound(r.id, r.gen))?;

    let (body, (id, gen)) = object_header(&data[start..]).map_err(|_| Error::ParseAt {
        offset: start,
        reason: format!("no object header for {}", r),
    })?;
    if id != r.id {
        return Err(Error::ParseAt {
            offset: start,
            reason: format!("xref points {} at object {} {}", r, id, gen),
        });
    }
    if gen != r.gen {
        log::warn!("{} resolved to generation {}", r, gen);
    }

    let end = buffer::find(body, b"endobj").ok_or_else(|| Error::ParseAt {
        offset: start,
        reason: format!("object {} has no endobj", r),
    })?;
    Ok(&body[..end])
}

/// Text inside the object's dictionary: between its first `<<` and last `>>`.
pub fn find_object<'a>(data: &'a [u8], xref: &CrossRefTable, r: ObjectRef) -> Result<&'a [u8]> {
    let body = find_object_body(data, xref, r)?;
    let open = buffer::find(body, b"<<");
    let close = buffer::rfind(body, b">>");
    match (open, close) {
        (Some(open), Some(close)) if close >= open + 2 => Ok(&body[open + 2..close]),
        _ => Err(Error::Parse(format!("object {} is not a dictionary", r))),
    }
}

/// Resolve `r` and parse it as a dictionary.
pub fn resolve_dictionary(data: &[u8], xref: &CrossRefTable, r: ObjectRef) -> Result<Dictionary> {
    parse_dictionary_inner(find_object(data, xref, r)?)
}

/// Resolve `value` to an array, following one level of indirection.
pub fn resolve_array(data: &[u8], xref: &CrossRefTable, value: &Object) -> Result<Vec<Object>> {
    match value {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(r) => match parse_value(find_object_body(data, xref, *r)?)? {
            Object::Array(items) => Ok(items),
            other => Err(Error::Parse(format!("{} is a {}, expected an array", r, other.type_name()))),
        },
        other => Err(Error::Parse(format!("expected an array, found {}", other.type_name()))),
    }
}

fn references_in(items: Vec<Object>, what: &str) -> Vec<ObjectRef> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Object::Reference(r) => Some(r),
            other => {
                log::warn!("ignoring non-reference {} in {}", other.type_name(), what);
                None
            },
        })
        .collect()
}

impl PdfStructure {
    /// The document catalog dictionary.
    pub fn catalog(&self, data: &[u8]) -> Result<Dictionary> {
        resolve_dictionary(data, &self.xref, self.trailer.root)
    }

    /// Reference to the first page of the document.
    ///
    /// Follows `/Pages` and the first `/Kids` entry down to a `/Page` leaf.
    pub fn first_page_ref(&self, data: &[u8]) -> Result<ObjectRef> {
        let catalog = self.catalog(data)?;
        let mut node = catalog
            .get("Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| Error::Parse("catalog has no /Pages reference".to_string()))?;

        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let dict = resolve_dictionary(data, &self.xref, node)?;
            let is_tree_node = dict.get("Type").and_then(Object::as_name) == Some("Pages")
                || dict.contains_key("Kids");
            if !is_tree_node {
                return Ok(node);
            }
            let kids = match dict.get("Kids") {
                Some(kids) => resolve_array(data, &self.xref, kids)?,
                None => Vec::new(),
            };
            node = kids
                .first()
                .and_then(Object::as_reference)
                .ok_or_else(|| Error::Parse(format!("page tree node {} has no kids", node)))?;
        }

        Err(Error::Parse(format!("page tree deeper than {} levels", MAX_PAGE_TREE_DEPTH)))
    }

    /// The AcroForm reachable from the catalog, if any.
    ///
    /// When the catalog has no `/AcroForm` entry the buffer is scanned for the
    /// last `/Type /AcroForm` object as a fallback.
    pub fn acroform(&self, data: &[u8]) -> Result<Option<AcroForm>> {
        let catalog = self.catalog(data)?;
        let (object_ref, dict, linked_from_catalog) = match catalog.get("AcroForm") {
            Some(Object::Reference(r)) => (Some(*r), resolve_dictionary(data, &self.xref, *r)?, true),
            Some(Object::Dictionary(dict)) => (None, dict.clone(), true),
            Some(other) => {
                return Err(Error::Parse(format!("/AcroForm is a {}", other.type_name())));
            },
            None => match self.scan_acroform(data) {
                Some(r) => (Some(r), resolve_dictionary(data, &self.xref, r)?, false),
                None => return Ok(None),
            },
        };

        let fields = match dict.get("Fields") {
            Some(value) => references_in(resolve_array(data, &self.xref, value)?, "/Fields"),
            None => Vec::new(),
        };
        Ok(Some(AcroForm {
            object_ref,
            linked_from_catalog,
            dict,
            fields,
        }))
    }

    /// Locate an AcroForm object by its `/Type` marker instead of the catalog.
    fn scan_acroform(&self, data: &[u8]) -> Option<ObjectRef> {
        let marker = buffer::rfind(data, b"/Type /AcroForm")
            .or_else(|| buffer::rfind(data, b"/Type/AcroForm"))?;

        let mut end = marker;
        let header = loop {
            let obj = buffer::rfind_before(data, b"obj", end)?;
            if obj >= 3 && &data[obj - 3..obj] == b"end" {
                end = obj;
                continue;
            }
            break obj;
        };

        let window = &data[header.saturating_sub(32)..header];
        let caps = OBJECT_HEADER_TAIL.captures(window)?;
        let id = std::str::from_utf8(&caps[1]).ok()?.parse().ok()?;
        let gen = std::str::from_utf8(&caps[2]).ok()?.parse().ok()?;
        let r = ObjectRef::new(id, gen);

        if self.xref.get(id).map_or(false, |e| e.in_use) {
            log::debug!("found AcroForm {} by scanning", r);
            Some(r)
        } else {
            None
        }
    }
}
