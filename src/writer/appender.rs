//! Incremental update writer.
//!
//! Appends new and replacement objects after the original bytes, followed
//! by an xref section that lists only those objects and a trailer chained to
//! the previous section through `/Prev`. The original bytes are never
//! modified.

use crate::object::{Object, ObjectRef};
use crate::writer::ObjectSerializer;
use std::collections::BTreeMap;

/// Trailer values for an incremental update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTrailer {
    /// `/Root` catalog reference
    pub root: ObjectRef,
    /// `/Info` reference carried over from the previous trailer
    pub info: Option<ObjectRef>,
    /// `/ID` carried over from the previous trailer
    pub id: Option<Object>,
    /// Offset of the previous xref section
    pub prev: u64,
}

/// Builds an incremental update on top of an existing PDF.
#[derive(Debug)]
pub struct IncrementalAppender {
    buffer: Vec<u8>,
    offsets: BTreeMap<u32, (u64, u16)>,
    next_id: u32,
    serializer: ObjectSerializer,
}

impl IncrementalAppender {
    /// Start an update after `original`, allocating ids from `size` upwards.
    pub fn new(original: &[u8], size: u32) -> Self {
        let mut buffer = Vec::with_capacity(original.len() + 16 * 1024);
        buffer.extend_from_slice(original);
        if !matches!(buffer.last(), Some(b'\n') | Some(b'\r')) {
            buffer.push(b'\n');
        }
        Self {
            buffer,
            offsets: BTreeMap::new(),
            next_id: size.max(1),
            serializer: ObjectSerializer::new(),
        }
    }

    /// Current end of the output, i.e. the offset the next object lands at.
    pub fn current_end_offset(&self) -> usize {
        self.buffer.len()
    }

    /// Append `obj` under a freshly allocated object number.
    pub fn allocate_object(&mut self, obj: &Object) -> ObjectRef {
        let r = ObjectRef::new(self.next_id, 0);
        self.next_id += 1;
        self.write_object(r, obj);
        r
    }

    /// Append a new revision of the existing object `r`.
    pub fn replace_object(&mut self, r: ObjectRef, obj: &Object) {
        if r.id >= self.next_id {
            self.next_id = r.id + 1;
        }
        self.write_object(r, obj);
    }

    fn write_object(&mut self, r: ObjectRef, obj: &Object) {
        let offset = self.current_end_offset() as u64;
        self.buffer.extend_from_slice(&self.serializer.serialize_indirect(r, obj));
        log::debug!("appended {} at offset {}", r, offset);
        self.offsets.insert(r.id, (offset, r.gen));
    }

    /// Write the xref section and trailer and return the complete file.
    ///
    /// The output ends with `%%EOF` and no trailing newline.
    pub fn finish(mut self, trailer: &UpdateTrailer) -> Vec<u8> {
        let xref_offset = self.current_end_offset();
        let mut xref = String::from("xref\n0 1\n0000000000 65535 f \n");

        let entries: Vec<(u32, (u64, u16))> = self.offsets.iter().map(|(id, e)| (*id, *e)).collect();
        let mut start = 0;
        while start < entries.len() {
            let mut end = start + 1;
            while end < entries.len() && entries[end].0 == entries[end - 1].0 + 1 {
                end += 1;
            }
            xref.push_str(&format!("{} {}\n", entries[start].0, end - start));
            for (_, (offset, gen)) in &entries[start..end] {
                xref.push_str(&format!("{:010} {:05} n \n", offset, gen));
            }
            start = end;
        }

        xref.push_str(&format!("trailer\n<<\n/Size {}\n/Root {}\n", self.next_id, trailer.root));
        if let Some(info) = trailer.info {
            xref.push_str(&format!("/Info {}\n", info));
        }
        if let Some(id) = &trailer.id {
            xref.push_str(&format!("/ID {}\n", self.serializer.serialize_to_string(id)));
        }
        xref.push_str(&format!(
            "/Prev {}\n>>\nstartxref\n{}\n%%EOF",
            trailer.prev, xref_offset
        ));

        self.buffer.extend_from_slice(xref.as_bytes());
        self.buffer
    }
}
