use super::*;

#[test]
fn partial_json_falls_back_to_defaults() {
    let cfg = DocumentConfig::from_json(r#"{ "cross_page_links": true }"#).unwrap();
    assert!(cfg.cross_page_links);
    assert_eq!(cfg.max_nodes, DocumentConfig::default().max_nodes);
    assert!(cfg.legacy_widths.is_empty());
}

#[test]
fn legacy_widths_parse_from_plain_numbers() {
    let json = serde_json::json!({
        "legacy_widths": [{ "class": 0x0101, "para": 7, "words": 3 }]
    });
    let cfg = DocumentConfig::from_json(&json.to_string()).unwrap();
    assert_eq!(
        cfg.legacy_widths,
        vec![LegacyWidthEntry {
            class: ClassId(0x0101),
            para: ParaId(7),
            words: 3,
        }]
    );
}

#[test]
fn unknown_fields_and_bad_limits_are_rejected() {
    assert!(matches!(
        DocumentConfig::from_json(r#"{ "max_nodez": 4 }"#),
        Err(OpforgeError::Config(_))
    ));
    assert!(matches!(
        DocumentConfig::from_json(r#"{ "max_words": 0 }"#),
        Err(OpforgeError::Config(_))
    ));
    assert!(matches!(
        DocumentConfig::from_json(r#"{ "max_nodes": 4, "arena_initial_nodes": 8 }"#),
        Err(OpforgeError::Config(_))
    ));
}
