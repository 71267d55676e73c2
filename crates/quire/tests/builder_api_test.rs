//! Integration tests for the DocumentBuilder API
//!
//! These tests verify that the public API works and is usable.

use quire::{DocumentBuilder, QuireError, config::AppConfig, element::Element};

#[test]
fn test_parse_simple_document() {
    let source = "= Guide\n\nFirst paragraph.\n\n== Details\n\nMore text.\n";

    let builder = DocumentBuilder::default();
    let document = builder.parse(source).expect("Failed to parse document");

    assert_eq!(document.title().as_deref(), Some("Guide"));
    assert!(
        document
            .elements()
            .iter()
            .any(|element| matches!(element, Element::Section(_)))
    );
}

#[test]
fn test_render_json() {
    let builder = DocumentBuilder::default();
    let document = builder
        .parse("A paragraph.footnote:[A note.]\n")
        .expect("Failed to parse document");

    let json = builder
        .render_json(&document, true)
        .expect("Failed to render document");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["footnotes"].as_array().map(Vec::len), Some(1));
    assert!(json.ends_with('\n'));
}

#[test]
fn test_builder_with_config() {
    let config: AppConfig = toml::from_str(
        r#"
        [attributes]
        product = "Quire"

        [parser]
        drop_undefined_attributes = true
        "#,
    )
    .expect("valid config");

    let builder = DocumentBuilder::new(config);
    let document = builder
        .parse("{product} keeps {missing} notes.\n")
        .expect("Failed to parse document");

    let json = builder.render_json(&document, false).expect("render");
    assert!(json.contains("Quire keeps  notes."), "{json}");
}

#[test]
fn test_builder_override_wins_over_config() {
    let config: AppConfig =
        toml::from_str("[attributes]\nproduct = \"Quire\"\n").expect("valid config");

    let builder = DocumentBuilder::new(config).with_attribute("product", "Folio");
    let assemble = builder.assemble_config().expect("assemble config");
    assert_eq!(assemble.overrides.text("product"), Some("Folio"));
}

#[test]
fn test_parse_invalid_document_returns_error() {
    let source = "----\nnever closed\n";

    let builder = DocumentBuilder::default();
    let err = builder.parse(source).unwrap_err();
    match err {
        QuireError::Parse { err, src } => {
            assert_eq!(src, source);
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_invalid_config_is_reported() {
    let config: AppConfig =
        toml::from_str("[parser]\ndoctype = \"novel\"\n").expect("valid toml");

    let err = DocumentBuilder::new(config).parse("Text.\n").unwrap_err();
    assert!(matches!(err, QuireError::Config(_)));
}

#[test]
fn test_warnings_are_returned() {
    let builder = DocumentBuilder::default();
    let (_, warnings) = builder
        .parse_with_warnings("Hello {nobody}.\n")
        .expect("Failed to parse document");
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_builder_reusability() {
    let builder = DocumentBuilder::default();

    let first = builder.parse("* one\n* two\n").expect("Failed to parse first");
    let second = builder.parse("Plain.\n").expect("Failed to parse second");

    assert!(matches!(first.elements(), [Element::List(_)]));
    assert!(matches!(second.elements(), [Element::Paragraph(_)]));
}
