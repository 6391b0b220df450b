use super::*;
use serde_json::json;

fn result(id: &str, metadata: Value, document: &str, similarity: f32) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        document: document.to_string(),
        metadata: metadata.as_object().cloned().unwrap_or_default(),
        similarity,
    }
}

#[test]
fn empty_results_use_sentinel() {
    assert_eq!(format_search_results(&[]), NO_RESULTS_CONTEXT);
}

#[test]
fn full_metadata_block() {
    let results = [result(
        "auth",
        json!({
            "title": "Authentication",
            "url": "https://docs.example.com/auth",
            "type": "guide",
            "language": "python"
        }),
        "Send your secret key in the token header.",
        0.8734,
    )];

    let expected = "DOCUMENT: Authentication\n\
                    URL: https://docs.example.com/auth\n\
                    TYPE: guide\n\
                    LANGUAGE: python\n\
                    RELEVANCE: 87.3%\n\
                    Send your secret key in the token header.\n\
                    ---";
    assert_eq!(format_search_results(&results), expected);
}

#[test]
fn missing_metadata_uses_defaults() {
    let results = [result("bare", json!({}), "Plain text", 0.5)];

    let formatted = format_search_results(&results);

    assert!(formatted.starts_with("DOCUMENT: Untitled\nURL: No URL\n"));
    assert!(!formatted.contains("TYPE:"));
    assert!(!formatted.contains("LANGUAGE:"));
    assert!(formatted.contains("RELEVANCE: 50.0%"));
}

#[test]
fn blank_and_null_fields_are_absent() {
    let results = [result(
        "blank",
        json!({ "title": "  ", "url": null, "type": "" }),
        "Body",
        0.1,
    )];

    let formatted = format_search_results(&results);

    assert!(formatted.contains("DOCUMENT: Untitled"));
    assert!(formatted.contains("URL: No URL"));
    assert!(!formatted.contains("TYPE:"));
}

#[test]
fn order_is_preserved_with_delimiters() {
    let results = [
        result("first", json!({ "title": "First" }), "one", 0.9),
        result("second", json!({ "title": "Second" }), "two", 0.4),
    ];

    let formatted = format_search_results(&results);
    let first = formatted.find("DOCUMENT: First").expect("first block");
    let second = formatted.find("DOCUMENT: Second").expect("second block");

    assert!(first < second);
    assert_eq!(formatted.matches("\n---").count(), 2);
    assert!(formatted.contains("---\nDOCUMENT: Second"));
}

#[test]
fn negative_similarity_is_rendered() {
    let results = [result("neg", json!({}), "text", -0.25)];

    assert!(format_search_results(&results).contains("RELEVANCE: -25.0%"));
}

#[test]
fn type_without_language_block() {
    let results = [result(
        "ref",
        json!({ "title": "Orders", "url": "https://docs.example.com/orders", "type": "reference" }),
        "List orders with GET /orders.",
        0.5,
    )];

    let expected = "DOCUMENT: Orders\n\
                    URL: https://docs.example.com/orders\n\
                    TYPE: reference\n\
                    RELEVANCE: 50.0%\n\
                    List orders with GET /orders.\n\
                    ---";
    assert_eq!(format_search_results(&results), expected);
}
