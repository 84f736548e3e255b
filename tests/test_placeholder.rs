//! Placeholder insertion as an incremental update.

mod common;

use common::*;
use pdf_sigil::buffer;
use pdf_sigil::error::ErrorKind;
use pdf_sigil::object::{Name, Object, ObjectRef};
use pdf_sigil::reader::{read_pdf, resolve_array, resolve_dictionary};
use pdf_sigil::signatures::{add_placeholder, SignOptions};
use pdf_sigil::writer::ByteRangeArray;

#[test]
fn test_original_bytes_untouched() {
    let original = simple_pdf();
    let prepared = add_placeholder(&original, &SignOptions::default()).unwrap();
    assert!(prepared.len() > original.len());
    assert_eq!(&prepared[..original.len()], &original[..]);
    assert!(prepared.ends_with(b"%%EOF"));
}

#[test]
fn test_placeholder_contents() {
    let options = SignOptions::default().with_signature_length(16).with_location("Porto");
    let prepared = add_placeholder(&simple_pdf(), &options).unwrap();
    let text = String::from_utf8_lossy(&prepared);

    let byte_range = text.find(&format!("/ByteRange {}", ByteRangeArray::placeholder_text())).unwrap();
    let contents = text.find(&format!("/Contents <{}>", "0".repeat(32))).unwrap();
    assert!(byte_range < contents);
    assert!(text.contains("/Type /Sig"));
    assert!(text.contains("/Location (Porto)"));
    assert!(text.contains("/M (D:"));
    assert!(text.contains("/SigFlags 3"));
}

#[test]
fn test_new_acroform_and_annots() {
    let prepared = add_placeholder(&simple_pdf(), &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();

    // Objects 1..=5 existed; signature 6, widget 7, AcroForm 8.
    assert_eq!(structure.trailer.size, 9);
    assert_eq!(structure.trailer.info, Some(ObjectRef::new(5, 0)));

    let catalog = structure.catalog(&prepared).unwrap();
    assert_eq!(catalog.get("AcroForm"), Some(&Object::Reference(ObjectRef::new(8, 0))));

    let form = structure.acroform(&prepared).unwrap().unwrap();
    assert_eq!(form.fields, vec![ObjectRef::new(7, 0)]);

    let page_ref = structure.first_page_ref(&prepared).unwrap();
    let page = resolve_dictionary(&prepared, &structure.xref, page_ref).unwrap();
    assert_eq!(page.get("Annots"), Some(&Object::Array(vec![Object::Reference(ObjectRef::new(7, 0))])));
    assert_eq!(page.get("Contents"), Some(&Object::Reference(ObjectRef::new(4, 0))));

    let widget = resolve_dictionary(&prepared, &structure.xref, ObjectRef::new(7, 0)).unwrap();
    assert_eq!(widget.get("FT").and_then(Object::as_name), Some("Sig"));
    assert_eq!(widget.get("V"), Some(&Object::Reference(ObjectRef::new(6, 0))));
    assert_eq!(widget.get("P"), Some(&Object::Reference(page_ref)));
    assert_eq!(widget.get("F").and_then(Object::as_integer), Some(132));
    assert_eq!(widget.get("T").and_then(Object::as_string), Some(&b"Signature1"[..]));
}

#[test]
fn test_existing_fields_are_merged_in_order() {
    let original = pdf_with_form();
    let prepared = add_placeholder(&original, &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();

    let form = structure.acroform(&prepared).unwrap().unwrap();
    assert_eq!(form.object_ref, Some(ObjectRef::new(4, 0)));
    assert_eq!(form.fields.len(), 3);
    assert_eq!(&form.fields[..2], &[ObjectRef::new(5, 0), ObjectRef::new(6, 0)]);
    assert_eq!(form.dict.get("SigFlags").and_then(Object::as_integer), Some(3));
    assert_eq!(form.dict.get("DA").and_then(Object::as_string), Some(&b"/Helv 0 Tf 0 g"[..]));

    // The catalog already pointed at the form, so it is not rewritten.
    let catalog_at = structure.xref.get(1).unwrap().offset as usize;
    assert!(catalog_at < original.len());

    let widget = resolve_dictionary(&prepared, &structure.xref, form.fields[2]).unwrap();
    assert_eq!(widget.get("T").and_then(Object::as_string), Some(&b"Signature3"[..]));
}

#[test]
fn test_indirect_annots_are_resolved() {
    let prepared = add_placeholder(&pdf_with_form(), &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();
    let page = resolve_dictionary(&prepared, &structure.xref, ObjectRef::new(3, 0)).unwrap();
    let annots = resolve_array(&prepared, &structure.xref, page.get("Annots").unwrap()).unwrap();
    let refs: Vec<ObjectRef> = annots.iter().filter_map(Object::as_reference).collect();
    assert_eq!(refs.len(), 3);
    assert_eq!(&refs[..2], &[ObjectRef::new(5, 0), ObjectRef::new(6, 0)]);
}

#[test]
fn test_inline_acroform_is_promoted() {
    let original = build_pdf(
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R /AcroForm << /Fields [4 0 R] >> >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R] >>"),
            (4, "<< /FT /Tx /T (name) /Type /Annot /Subtype /Widget /Rect [0 0 1 1] >>"),
        ],
        "",
    );
    let prepared = add_placeholder(&original, &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();

    let catalog = structure.catalog(&prepared).unwrap();
    assert!(catalog.get("AcroForm").and_then(Object::as_reference).is_some());
    let form = structure.acroform(&prepared).unwrap().unwrap();
    assert_eq!(form.fields.len(), 2);
    assert_eq!(form.fields[0], ObjectRef::new(4, 0));
}

#[test]
fn test_unlinked_acroform_is_attached_to_catalog() {
    let original = build_pdf(
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, "<< /Type /Page /Parent 2 0 R /Annots [5 0 R] >>"),
            (4, "<< /Type /AcroForm /Fields [5 0 R] >>"),
            (5, "<< /FT /Tx /T (name) /Type /Annot /Subtype /Widget /Rect [0 0 1 1] >>"),
        ],
        "",
    );
    let prepared = add_placeholder(&original, &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();

    let catalog = structure.catalog(&prepared).unwrap();
    assert_eq!(catalog.get("AcroForm"), Some(&Object::Reference(ObjectRef::new(4, 0))));

    let form = structure.acroform(&prepared).unwrap().unwrap();
    assert!(form.linked_from_catalog);
    assert_eq!(form.fields, vec![ObjectRef::new(5, 0), ObjectRef::new(7, 0)]);
    assert_eq!(structure.trailer.size, 8);
}

#[test]
fn test_prev_chain_input() {
    let base = simple_pdf();
    let updated = append_update(&base, &[(3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] >>")]);
    let prepared = add_placeholder(&updated, &SignOptions::default()).unwrap();
    let structure = read_pdf(&prepared).unwrap();

    let page = resolve_dictionary(&prepared, &structure.xref, ObjectRef::new(3, 0)).unwrap();
    let media_box = page.get("MediaBox").and_then(Object::as_array).unwrap();
    assert_eq!(media_box[2], Object::Integer(595));
    assert!(page.contains_key("Annots"));

    // Older objects still resolve through the chain.
    let pages = resolve_dictionary(&prepared, &structure.xref, ObjectRef::new(2, 0)).unwrap();
    assert_eq!(pages.get("Count").and_then(Object::as_integer), Some(1));
}

#[test]
fn test_page_rewrite_keeps_reals_and_names() {
    let original = build_pdf(
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (
                3,
                "<< /Type /Page /Parent 2 0 R /UserUnit 0.000001 /MediaBox [0 0 595.2755905 841.8897638] \
                 /Resources << /Font << /F#E9 4 0 R >> >> >>",
            ),
            (4, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>"),
        ],
        "",
    );
    let prepared = add_placeholder(&original, &SignOptions::default()).unwrap();
    let update = &prepared[original.len()..];
    assert!(buffer::find(update, b"/F#E9 4 0 R").is_some());
    assert!(buffer::find(update, "\u{FFFD}".as_bytes()).is_none());
    assert!(buffer::find(update, b"/MediaBox [0 0 595.2755905 841.8897638]").is_some());

    let structure = read_pdf(&prepared).unwrap();
    let page = resolve_dictionary(&prepared, &structure.xref, ObjectRef::new(3, 0)).unwrap();
    assert!(page.contains_key("Annots"));
    assert_eq!(page.get("UserUnit"), Some(&Object::Real(0.000001)));
    let media_box = page.get("MediaBox").and_then(Object::as_array).unwrap();
    assert_eq!(media_box[2], Object::Real(595.2755905));
    assert_eq!(media_box[3], Object::Real(841.8897638));

    let resources = page.get("Resources").and_then(Object::as_dict).unwrap();
    let fonts = resources.get("Font").and_then(Object::as_dict).unwrap();
    assert_eq!(
        fonts.get(&Name::new(vec![b'F', 0xE9])),
        Some(&Object::Reference(ObjectRef::new(4, 0)))
    );
}

#[test]
fn test_read_is_idempotent() {
    let prepared = add_placeholder(&pdf_with_form(), &SignOptions::default()).unwrap();
    let first = read_pdf(&prepared).unwrap();
    let second = read_pdf(&prepared).unwrap();
    assert_eq!(first.trailer.root, second.trailer.root);
    assert_eq!(first.xref_position, second.xref_position);
    let a: Vec<_> = first.xref.iter().map(|(id, e)| (id, *e)).collect();
    let b: Vec<_> = second.xref.iter().map(|(id, e)| (id, *e)).collect();
    assert_eq!(a, b);
}

#[test]
fn test_visible_widget_rect() {
    let options = SignOptions::default().with_widget_rect([36.0, 36.0, 236.0, 96.5]);
    let prepared = add_placeholder(&simple_pdf(), &options).unwrap();
    assert!(buffer::find(&prepared, b"/Rect [36 36 236 96.5]").is_some());
}

#[test]
fn test_broken_input_is_rejected() {
    let err = add_placeholder(b"%PDF-1.4\nnot really a pdf\n%%EOF", &SignOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let mut no_root = simple_pdf();
    let at = buffer::rfind(&no_root, b"/Root 1 0 R").unwrap();
    no_root[at..at + 5].copy_from_slice(b"/Xoot");
    let err = add_placeholder(&no_root, &SignOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}
