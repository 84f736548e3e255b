//! Cross-reference table parser.
//!
//! The xref table maps object numbers to byte offsets in the PDF file,
//! enabling random access to objects. Only classic `xref` tables are
//! understood; a `startxref` pointing at a cross-reference stream is
//! reported as a parse error.
//!
//! Incrementally updated files carry several sections chained by `/Prev`.
//! [`parse_xref_chain`] folds them into one table where the newest entry
//! for each object number wins.

use crate::error::{Error, Result};
use crate::lexer::{object_header, skip_ws, xref_entry, xref_subsection_header};
use crate::object::{Dictionary, Object};
use crate::parser::parse_value;
use std::collections::{BTreeMap, HashSet};

/// Maximum number of `/Prev` links followed before giving up.
pub const MAX_PREV_DEPTH: usize = 100;

/// Cross-reference table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Byte offset of the `N G obj` header (next free object for free entries)
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// Whether the object is in use
    pub in_use: bool,
}

impl XRefEntry {
    /// Create a new cross-reference entry.
    pub fn new(offset: u64, generation: u16, in_use: bool) -> Self {
        Self {
            offset,
            generation,
            in_use,
        }
    }

    /// Create a new in-use entry.
    pub fn in_use(offset: u64, generation: u16) -> Self {
        Self::new(offset, generation, true)
    }

    /// Create a new free entry.
    pub fn free(next_free: u64, generation: u16) -> Self {
        Self::new(next_free, generation, false)
    }
}

/// Cross-reference table that maps object numbers to their locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossRefTable {
    entries: BTreeMap<u32, XRefEntry>,
}

impl CrossRefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any existing one for the same object number.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Check if an object exists in the xref table.
    pub fn contains(&self, object_number: u32) -> bool {
        self.entries.contains_key(&object_number)
    }

    /// Iterate entries in ascending object-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Highest object number present, if any.
    pub fn max_object_number(&self) -> Option<u32> {
        self.entries.keys().next_back().copied()
    }

    /// Merge entries from an older xref table.
    ///
    /// Entries in self override entries in other.
    pub fn merge_from(&mut self, other: CrossRefTable) {
        for (obj_num, entry) in other.entries {
            self.entries.entry(obj_num).or_insert(entry);
        }
    }

    /// Get the number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `xref` ... `trailer << >>` section.
#[derive(Debug, Clone)]
pub struct XRefSection {
    /// Entries declared by this section only
    pub table: CrossRefTable,
    /// The section's trailer dictionary
    pub trailer: Dictionary,
}

impl XRefSection {
    /// The `/Prev` offset of the previous section, if any.
    pub fn prev_offset(&self) -> Option<u64> {
        self.trailer
            .get("Prev")
            .and_then(Object::as_integer)
            .and_then(|p| u64::try_from(p).ok())
    }
}

fn position(data: &[u8], rest: &[u8]) -> usize {
    data.len() - rest.len()
}

/// Parse the classic xref section starting at `offset`.
///
/// # Errors
///
/// Returns a parse error when the offset is out of bounds, when it points at
/// a cross-reference stream, or when a subsection header or row is malformed.
pub fn parse_xref_section(data: &[u8], offset: u64) -> Result<XRefSection> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&o| o < data.len())
        .ok_or_else(|| Error::Parse(format!("xref offset {} is beyond end of file", offset)))?;

    let (mut rest, _) = skip_ws(&data[start..]).map_err(|_| Error::Parse("unreadable xref".into()))?;
    if !rest.starts_with(b"xref") {
        if object_header(rest).is_ok() {
            return Err(Error::Parse(format!(
                "cross-reference stream at offset {} is not supported",
                offset
            )));
        }
        return Err(Error::ParseAt {
            offset: start,
            reason: "expected 'xref' keyword".to_string(),
        });
    }
    rest = &rest[4..];

    let mut table = CrossRefTable::new();
    loop {
        let (after_ws, _) = skip_ws(rest).map_err(|_| Error::Parse("unreadable xref".into()))?;
        rest = after_ws;
        if rest.is_empty() {
            return Err(Error::Parse("xref table is not followed by a trailer".to_string()));
        }
        if rest.starts_with(b"trailer") {
            rest = &rest[7..];
            break;
        }

        let (after_header, (first, count)) = xref_subsection_header(rest).map_err(|_| Error::ParseAt {
            offset: position(data, rest),
            reason: "malformed xref subsection header".to_string(),
        })?;
        rest = after_header;
        log::debug!("xref subsection {} +{} at offset {}", first, count, position(data, rest));

        for i in 0..count {
            let (after_row, (entry_offset, generation, in_use)) =
                xref_entry(rest).map_err(|_| Error::ParseAt {
                    offset: position(data, rest),
                    reason: format!("unparsable xref entry for object {}", first.saturating_add(i)),
                })?;
            rest = after_row;
            table.add_entry(first.saturating_add(i), XRefEntry::new(entry_offset, generation, in_use));
        }
    }

    let trailer = match parse_value(rest)? {
        Object::Dictionary(dict) => dict,
        other => {
            return Err(Error::Parse(format!(
                "trailer is a {} rather than a dictionary",
                other.type_name()
            )))
        },
    };

    Ok(XRefSection { table, trailer })
}

/// Parse the section at `offset` and every older section reachable via `/Prev`.
///
/// Newer entries win. Chains longer than [`MAX_PREV_DEPTH`] or containing a
/// cycle are rejected.
pub fn parse_xref_chain(data: &[u8], offset: u64) -> Result<CrossRefTable> {
    let mut merged = CrossRefTable::new();
    let mut visited = HashSet::new();
    let mut next = Some(offset);
    let mut depth = 0;

    while let Some(current) = next {
        if depth >= MAX_PREV_DEPTH {
            return Err(Error::Parse(format!(
                "xref /Prev chain exceeds {} sections",
                MAX_PREV_DEPTH
            )));
        }
        if !visited.insert(current) {
            return Err(Error::Parse(format!("xref /Prev chain loops back to offset {}", current)));
        }

        let section = parse_xref_section(data, current)?;
        log::debug!(
            "xref section at {} declares {} entries (depth {})",
            current,
            section.table.len(),
            depth
        );
        next = section.prev_offset();
        merged.merge_from(section.table);
        depth += 1;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &[u8] = b"xref\n0 3\n0000000000 65535 f \n0000000009 00000 n \n0000000058 00000 n \ntrailer\n<< /Size 3 /Root 1 0 R >>\nstartxref\n0\n%%EOF";

    #[test]
    fn test_cross_ref_table_add_and_get() {
        let mut xref = CrossRefTable::new();
        assert!(xref.is_empty());
        xref.add_entry(5, XRefEntry::in_use(1234, 0));
        assert_eq!(xref.get(5), Some(&XRefEntry::in_use(1234, 0)));
        assert!(xref.get(6).is_none());
        assert!(xref.contains(5));
        assert_eq!(xref.max_object_number(), Some(5));
    }

    #[test]
    fn test_merge_keeps_newer_entries() {
        let mut newer = CrossRefTable::new();
        newer.add_entry(3, XRefEntry::in_use(900, 0));
        let mut older = CrossRefTable::new();
        older.add_entry(3, XRefEntry::in_use(100, 0));
        older.add_entry(4, XRefEntry::in_use(200, 0));
        newer.merge_from(older);
        assert_eq!(newer.get(3).unwrap().offset, 900);
        assert_eq!(newer.get(4).unwrap().offset, 200);
    }

    #[test]
    fn test_parse_single_section() {
        let section = parse_xref_section(SINGLE, 0).unwrap();
        assert_eq!(section.table.len(), 3);
        assert!(!section.table.get(0).unwrap().in_use);
        assert_eq!(section.table.get(2).unwrap().offset, 58);
        assert_eq!(section.trailer["Size"], Object::Integer(3));
        assert_eq!(section.prev_offset(), None);
    }

    #[test]
    fn test_parse_multiple_subsections() {
        let data = b"xref\r\n0 1\r\n0000000000 65535 f\r\n4 2\r\n0000000100 00000 n\r\n0000000200 00001 n\r\ntrailer<</Size 6/Prev 17>>";
        let section = parse_xref_section(data, 0).unwrap();
        assert_eq!(section.table.len(), 3);
        assert_eq!(section.table.get(5), Some(&XRefEntry::in_use(200, 1)));
        assert_eq!(section.prev_offset(), Some(17));
    }

    #[test]
    fn test_xref_stream_is_rejected() {
        let data = b"12 0 obj\n<< /Type /XRef >>\nstream\nendstream\nendobj";
        let err = parse_xref_section(data, 0).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_malformed_rows_are_errors() {
        let bad_header = b"xref\n0 x\ntrailer<<>>";
        assert!(matches!(parse_xref_section(bad_header, 0), Err(Error::ParseAt { .. })));

        let bad_row = b"xref\n0 2\n0000000000 65535 f \n00000x0009 00000 n \ntrailer<<>>";
        assert!(matches!(parse_xref_section(bad_row, 0), Err(Error::ParseAt { .. })));

        let missing_trailer = b"xref\n0 1\n0000000000 65535 f \n";
        assert!(parse_xref_section(missing_trailer, 0).is_err());
    }

    #[test]
    fn test_offset_out_of_bounds() {
        assert!(parse_xref_section(SINGLE, 10_000).is_err());
        assert!(parse_xref_section(SINGLE, 5).is_err());
    }

    #[test]
    fn test_chain_follows_prev() {
        let older = b"xref\n0 2\n0000000000 65535 f \n0000000010 00000 n \ntrailer\n<< /Size 2 >>\n";
        let mut data = older.to_vec();
        let newer_at = data.len();
        data.extend_from_slice(
            b"xref\n1 2\n0000000500 00000 n \n0000000600 00000 n \ntrailer\n<< /Size 3 /Prev 0 >>\n",
        );
        let table = parse_xref_chain(&data, newer_at as u64).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).unwrap().offset, 500);
        assert_eq!(table.get(2).unwrap().offset, 600);
    }

    #[test]
    fn test_chain_cycle_detected() {
        let data = b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev 0 >>\n";
        let err = parse_xref_chain(data, 0).unwrap_err();
        assert!(err.to_string().contains("loops"));
    }
}
