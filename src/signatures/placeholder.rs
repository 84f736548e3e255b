//! Signature placeholder insertion.
//!
//! Prepares a document for signing by appending an incremental update that
//! contains:
//!
//! - a `/Type /Sig` dictionary with a zero-filled `/Contents` and a
//!   placeholder `/ByteRange`,
//! - a signature widget annotation on the first page,
//! - the AcroForm with the widget appended to `/Fields`,
//! - the first page with the widget appended to `/Annots`,
//! - the catalog, when it did not already point at an indirect AcroForm.
//!
//! The original bytes are copied unchanged in front of the update.

use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::reader::{read_pdf, resolve_array, resolve_dictionary};
use crate::signatures::types::SignOptions;
use crate::writer::{ByteRangeArray, IncrementalAppender, ObjectSerializer, UpdateTrailer};

/// Widget annotation flags: Print (4) | Locked (128).
const WIDGET_FLAGS: i64 = 132;

/// AcroForm `/SigFlags`: SignaturesExist | AppendOnly.
const SIG_FLAGS: i64 = 3;

/// Build the `/Type /Sig` dictionary with its placeholders.
///
/// `/ByteRange` is emitted before `/Contents`.
pub fn signature_dictionary(options: &SignOptions) -> Object {
    let mut dict = Dictionary::new();
    dict.insert("Type".into(), Object::name("Sig"));
    dict.insert("Filter".into(), Object::name("Adobe.PPKLite"));
    dict.insert("SubFilter".into(), Object::name(options.sub_filter.as_pdf_name()));
    dict.insert("ByteRange".into(), ByteRangeArray::placeholder_object());
    dict.insert("Contents".into(), Object::String(vec![0u8; options.signature_length]));
    if let Some(reason) = &options.reason {
        dict.insert("Reason".into(), ObjectSerializer::text(reason));
    }
    dict.insert("M".into(), Object::string(&pdf_date(chrono::Utc::now())));
    if let Some(contact_info) = &options.contact_info {
        dict.insert("ContactInfo".into(), ObjectSerializer::text(contact_info));
    }
    if let Some(name) = &options.name {
        dict.insert("Name".into(), ObjectSerializer::text(name));
    }
    if let Some(location) = &options.location {
        dict.insert("Location".into(), ObjectSerializer::text(location));
    }
    Object::Dictionary(dict)
}

/// Format a PDF date string: `D:YYYYMMDDHHmmSSZ`.
fn pdf_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("D:%Y%m%d%H%M%SZ").to_string()
}

fn widget_annotation(options: &SignOptions, signature: ObjectRef, page: ObjectRef, field_number: usize) -> Object {
    ObjectSerializer::dict(vec![
        ("Type", Object::name("Annot")),
        ("Subtype", Object::name("Widget")),
        ("FT", Object::name("Sig")),
        ("Rect", ObjectSerializer::rect(options.widget_rect)),
        ("V", Object::Reference(signature)),
        ("T", Object::string(&format!("Signature{}", field_number))),
        ("F", Object::Integer(WIDGET_FLAGS)),
        ("P", Object::Reference(page)),
    ])
}

/// Append a signature placeholder to `pdf` as an incremental update.
///
/// # Errors
///
/// Fails with a parse error when the trailer, cross-reference table, catalog
/// or page tree cannot be read, and with an input error for unusable
/// options.
pub fn add_placeholder(pdf: &[u8], options: &SignOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let structure = read_pdf(pdf)?;
    let page_ref = structure.first_page_ref(pdf)?;
    let mut page = resolve_dictionary(pdf, &structure.xref, page_ref)?;
    let acroform = structure.acroform(pdf)?;

    let mut appender = IncrementalAppender::new(pdf, structure.trailer.size);

    let mut fields = acroform.as_ref().map(|form| form.fields.clone()).unwrap_or_default();
    let signature_ref = appender.allocate_object(&signature_dictionary(options));
    let widget_ref =
        appender.allocate_object(&widget_annotation(options, signature_ref, page_ref, fields.len() + 1));
    fields.push(widget_ref);

    let mut form_dict = acroform.as_ref().map(|form| form.dict.clone()).unwrap_or_default();
    form_dict.insert("SigFlags".into(), Object::Integer(SIG_FLAGS));
    form_dict.insert(
        "Fields".into(),
        Object::Array(fields.iter().copied().map(Object::Reference).collect()),
    );
    let form_dict = Object::Dictionary(form_dict);

    let form_ref = match acroform.as_ref().and_then(|form| form.object_ref) {
        Some(form_ref) => {
            appender.replace_object(form_ref, &form_dict);
            form_ref
        },
        None => appender.allocate_object(&form_dict),
    };

    // Only an indirect form already linked from the catalog leaves it untouched.
    let catalog_links_form = acroform
        .as_ref()
        .map_or(false, |form| form.linked_from_catalog && form.object_ref.is_some());
    if !catalog_links_form {
        let mut catalog = structure.catalog(pdf)?;
        catalog.insert("AcroForm".into(), Object::Reference(form_ref));
        appender.replace_object(structure.trailer.root, &Object::Dictionary(catalog));
    }

    let mut annots = match page.get("Annots") {
        Some(existing) => resolve_array(pdf, &structure.xref, existing)?,
        None => Vec::new(),
    };
    annots.push(Object::Reference(widget_ref));
    page.insert("Annots".into(), Object::Array(annots));
    appender.replace_object(page_ref, &Object::Dictionary(page));

    let output = appender.finish(&UpdateTrailer {
        root: structure.trailer.root,
        info: structure.trailer.info,
        id: structure.trailer.id.clone(),
        prev: structure.xref_position,
    });
    log::debug!(
        "added signature placeholder {} as field Signature{} on page {}",
        signature_ref,
        fields.len(),
        page_ref
    );
    Ok(output)
}
