//! Session token and email allow-list behavior.

use chrono::Utc;
use uuid::Uuid;

use notabene_api::auth::{decode_token, issue_token, validate_email_domain, TOKEN_TTL_DAYS};

const SECRET: &str = "test-secret-0123456789-0123456789-0123456789";

#[test]
fn test_token_roundtrip() {
    let user_id = Uuid::new_v4();
    let (token, _expires) = issue_token(SECRET, user_id, "ana.pop@stud.ase.ro").unwrap();

    let claims = decode_token(SECRET, &token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "ana.pop@stud.ase.ro");
}

#[test]
fn test_token_expiry_is_seven_days() {
    let (_, expires) = issue_token(SECRET, Uuid::new_v4(), "x@stud.ase.ro").unwrap();
    let days = (expires - Utc::now()).num_days();
    assert_eq!(days, TOKEN_TTL_DAYS - 1, "expiry should be just under {} days away", TOKEN_TTL_DAYS);
}

#[test]
fn test_token_rejected_with_wrong_secret() {
    let (token, _) = issue_token(SECRET, Uuid::new_v4(), "x@stud.ase.ro").unwrap();
    let err = decode_token("another-secret-another-secret-another", &token).unwrap_err();
    assert!(matches!(err, notabene_core::Error::Unauthorized(_)));
}

#[test]
fn test_tampered_token_rejected() {
    let (token, _) = issue_token(SECRET, Uuid::new_v4(), "x@stud.ase.ro").unwrap();
    let mut tampered = token.clone();
    tampered.push('x');
    assert!(decode_token(SECRET, &tampered).is_err());
}

#[test]
fn test_allowed_domain_passes() {
    assert!(validate_email_domain("ana.pop@stud.ase.ro", "stud.ase.ro").is_ok());
    // Domain comparison is case-insensitive
    assert!(validate_email_domain("ana.pop@STUD.ASE.RO", "stud.ase.ro").is_ok());
}

#[test]
fn test_foreign_domain_rejected() {
    let err = validate_email_domain("ana@gmail.com", "stud.ase.ro").unwrap_err();
    assert!(matches!(err, notabene_core::Error::Forbidden(_)));
}

#[test]
fn test_malformed_email_rejected() {
    assert!(matches!(
        validate_email_domain("not-an-email", "stud.ase.ro").unwrap_err(),
        notabene_core::Error::InvalidInput(_)
    ));
    assert!(validate_email_domain("@stud.ase.ro", "stud.ase.ro").is_err());
    assert!(validate_email_domain("ana@", "stud.ase.ro").is_err());
}
