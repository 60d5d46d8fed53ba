//! CORS origin whitelist parsing.

use notabene_api::routes::parse_allowed_origins;

#[test]
fn test_unset_falls_back_to_local_dev_origins() {
    let origins = parse_allowed_origins(None);
    assert_eq!(origins.len(), 2);
    assert_eq!(origins[0], "http://localhost:3000");
}

#[test]
fn test_empty_value_falls_back_to_local_dev_origins() {
    let origins = parse_allowed_origins(Some("   "));
    assert_eq!(origins.len(), 2);
}

#[test]
fn test_comma_separated_list_is_parsed_and_trimmed() {
    let origins =
        parse_allowed_origins(Some("https://notes.example.ro, http://localhost:3000 ,"));
    assert_eq!(origins.len(), 2);
    assert_eq!(origins[0], "https://notes.example.ro");
    assert_eq!(origins[1], "http://localhost:3000");
}

#[test]
fn test_invalid_origins_are_skipped() {
    let origins = parse_allowed_origins(Some("https://ok.example\u{0}bad, https://good.example"));
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0], "https://good.example");
}
