//! Shared fixtures: small hand-built PDFs and throwaway signing identities.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509NameBuilder, X509};
use pdf_sigil::signatures::SigningCredentials;
use std::sync::OnceLock;

pub const SIGNER_CN: &str = "Test Signer";

/// Build a PDF whose xref table lists `objects` at their real offsets.
pub fn build_pdf(objects: &[(u32, &str)], trailer_extra: &str) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::new();
    for (id, body) in objects {
        offsets.push((*id, out.len()));
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }
    let xref_at = out.len();
    let size = objects.iter().map(|(id, _)| id + 1).max().unwrap_or(1);
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", size).as_bytes());
    for id in 1..size {
        match offsets.iter().find(|(i, _)| *i == id) {
            Some((_, offset)) => out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes()),
            None => out.extend_from_slice(b"0000000000 65535 f \n"),
        }
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R {}>>\nstartxref\n{}\n%%EOF\n",
            size, trailer_extra, xref_at
        )
        .as_bytes(),
    );
    out
}

/// One page, no form.
pub fn simple_pdf() -> Vec<u8> {
    build_pdf(
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>"),
            (4, "<< /Length 42 >>\nstream\nBT /F1 24 Tf 72 700 Td (Hello World) Tj ET\nendstream"),
            (5, "<< /Producer (fixture) >>"),
        ],
        "/Info 5 0 R ",
    )
}

/// One page with an indirect AcroForm holding two text fields, and the
/// page's `/Annots` stored as an indirect array.
pub fn pdf_with_form() -> Vec<u8> {
    build_pdf(
        &[
            (1, "<< /Type /Catalog /Pages 2 0 R /AcroForm 4 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Annots 7 0 R >>"),
            (4, "<< /Fields [5 0 R 6 0 R] /DA (/Helv 0 Tf 0 g) >>"),
            (5, "<< /FT /Tx /T (first) /Type /Annot /Subtype /Widget /Rect [10 10 100 30] /P 3 0 R >>"),
            (6, "<< /FT /Tx /T (second) /Type /Annot /Subtype /Widget /Rect [10 40 100 60] /P 3 0 R >>"),
            (7, "[5 0 R 6 0 R]"),
        ],
        "",
    )
}

/// Append an incremental update redefining `objects`, chained by `/Prev`.
pub fn append_update(pdf: &[u8], objects: &[(u32, &str)]) -> Vec<u8> {
    let text = String::from_utf8_lossy(pdf);
    let start = text.rfind("startxref").expect("startxref");
    let prev: u64 = text[start + "startxref".len()..]
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .expect("startxref offset");
    let size_at = text.rfind("/Size ").expect("/Size");
    let old_size: u32 = text[size_at + 6..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|v| v.parse().ok())
        .expect("size value");

    let mut out = pdf.to_vec();
    let mut offsets = Vec::new();
    for (id, body) in objects {
        offsets.push((*id, out.len()));
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
    for (id, offset) in &offsets {
        out.extend_from_slice(format!("{} 1\n{:010} 00000 n \n", id, offset).as_bytes());
    }
    let size = objects.iter().map(|(id, _)| id + 1).max().unwrap_or(1).max(old_size);
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Prev {} >>\nstartxref\n{}\n%%EOF\n",
            size, prev, xref_at
        )
        .as_bytes(),
    );
    out
}

/// A fresh RSA-2048 key and a self-signed certificate for `cn`.
pub fn key_and_certificate(cn: &str, serial: u32) -> (PKey<Private>, X509) {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    name.append_entry_by_text("O", "Fixture Org").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    (pkey, builder.build())
}

/// PKCS#12 bundle for `key`/`cert`, with optional extra CA certificates.
pub fn pkcs12_bundle(key: &PKey<Private>, cert: &X509, extra: &[X509], passphrase: &str) -> Vec<u8> {
    let mut builder = Pkcs12::builder();
    builder.name("signer").pkey(key).cert(cert);
    if !extra.is_empty() {
        let mut ca = Stack::new().unwrap();
        for c in extra {
            ca.push(c.clone()).unwrap();
        }
        builder.ca(ca);
    }
    builder.build2(passphrase).unwrap().to_der().unwrap()
}

struct Identity {
    pkcs12: Vec<u8>,
    certificate_der: Vec<u8>,
}

fn identity() -> &'static Identity {
    static IDENTITY: OnceLock<Identity> = OnceLock::new();
    IDENTITY.get_or_init(|| {
        let (key, cert) = key_and_certificate(SIGNER_CN, 0x1001);
        Identity {
            pkcs12: pkcs12_bundle(&key, &cert, &[], ""),
            certificate_der: cert.to_der().unwrap(),
        }
    })
}

/// Self-signed PKCS#12 bundle with an empty passphrase.
pub fn test_pkcs12() -> &'static [u8] {
    &identity().pkcs12
}

/// DER of the certificate inside [`test_pkcs12`].
pub fn test_certificate_der() -> &'static [u8] {
    &identity().certificate_der
}

/// Credentials loaded from [`test_pkcs12`].
pub fn test_credentials() -> SigningCredentials {
    SigningCredentials::from_pkcs12(test_pkcs12(), "").unwrap()
}

/// Check a detached CMS signature with OpenSSL, independently of this crate.
pub fn openssl_verify(signature_der: &[u8], signed_data: &[u8]) -> bool {
    let p7 = Pkcs7::from_der(signature_der).unwrap();
    let certs: Stack<X509> = Stack::new().unwrap();
    let store = X509StoreBuilder::new().unwrap().build();
    p7.verify(
        &certs,
        &store,
        Some(signed_data),
        None,
        Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
    )
    .is_ok()
}
