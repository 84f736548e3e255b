//! PKCS#12 loading and key/certificate matching.

mod common;

use common::*;
use pdf_sigil::error::{Error, ErrorKind};
use pdf_sigil::signatures::SigningCredentials;
use pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;

#[test]
fn test_load_bundle() {
    let credentials = SigningCredentials::from_pkcs12(test_pkcs12(), "").unwrap();
    assert_eq!(credentials.certificate_der(), test_certificate_der());
    assert!(credentials.chain().is_empty());
    assert_eq!(credentials.common_name().as_deref(), Some(SIGNER_CN));
    assert!(!format!("{:?}", credentials).contains("RsaPrivateKey"));
}

#[test]
fn test_wrong_passphrase() {
    let (key, cert) = key_and_certificate("Locked", 7);
    let bundle = pkcs12_bundle(&key, &cert, &[], "correct horse");

    let err = SigningCredentials::from_pkcs12(&bundle, "battery staple").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let credentials = SigningCredentials::from_pkcs12(&bundle, "correct horse").unwrap();
    assert_eq!(credentials.common_name().as_deref(), Some("Locked"));
}

#[test]
fn test_chain_certificates_are_kept() {
    let (key, cert) = key_and_certificate("Leaf", 11);
    let (_, ca_one) = key_and_certificate("Intermediate", 12);
    let (_, ca_two) = key_and_certificate("Root", 13);
    let bundle = pkcs12_bundle(&key, &cert, &[ca_one, ca_two], "");

    let credentials = SigningCredentials::from_pkcs12(&bundle, "").unwrap();
    assert_eq!(credentials.common_name().as_deref(), Some("Leaf"));
    assert_eq!(credentials.chain().len(), 2);
}

#[test]
fn test_mismatched_key_is_rejected() {
    let (_, cert) = key_and_certificate("Someone", 21);
    let (other_key, _) = key_and_certificate("Someone Else", 22);
    let key_der = other_key.private_key_to_pkcs8().unwrap();
    let private_key = RsaPrivateKey::from_pkcs8_der(&key_der).unwrap();

    let err = SigningCredentials::from_parts(vec![cert.to_der().unwrap()], private_key).unwrap_err();
    assert!(matches!(err, Error::Input(ref msg) if msg.contains("no certificate matches")));
}

#[test]
fn test_signer_found_anywhere_in_list() {
    let (key, cert) = key_and_certificate("Signer", 31);
    let (_, other) = key_and_certificate("Other", 32);
    let private_key = RsaPrivateKey::from_pkcs8_der(&key.private_key_to_pkcs8().unwrap()).unwrap();

    let credentials = SigningCredentials::from_parts(
        vec![other.to_der().unwrap(), cert.to_der().unwrap()],
        private_key,
    )
    .unwrap();
    assert_eq!(credentials.certificate_der(), cert.to_der().unwrap().as_slice());
    assert_eq!(credentials.chain(), &[other.to_der().unwrap()]);
}

#[test]
fn test_bundle_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signer.p12");
    std::fs::write(&path, test_pkcs12()).unwrap();
    let credentials = SigningCredentials::from_pkcs12_file(&path, "").unwrap();
    assert_eq!(credentials.common_name().as_deref(), Some(SIGNER_CN));
}
