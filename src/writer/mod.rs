//! PDF writing for incremental updates.
//!
//! ## Architecture
//!
//! ```text
//! Object (signature dict, widget, AcroForm, page)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! [IncrementalAppender] (appends objects, xref section, trailer)
//!     ↓
//! PDF bytes
//! ```
//!
//! [`ByteRangeArray`] reserves and later fills the fixed-width `/ByteRange`
//! slot inside the appended signature dictionary.

mod appender;
mod byte_range;
mod object_serializer;

pub use appender::{IncrementalAppender, UpdateTrailer};
pub use byte_range::{ByteRangeArray, LengthStable, BYTE_RANGE_SLOT};
pub use object_serializer::ObjectSerializer;
