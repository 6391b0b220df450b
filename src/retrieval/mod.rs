#[cfg(test)]
mod tests;

use serde_json::{Map, Value};

use crate::vector_store::SearchResult;

/// Context used when retrieval finds nothing
pub const NO_RESULTS_CONTEXT: &str = "No relevant documentation found.";

const DOCUMENT_DELIMITER: &str = "---";

/// Render ranked search results as the context block handed to the model.
///
/// Order is preserved. Title and URL fall back to placeholders; type and
/// language lines are only emitted when the metadata carries them.
#[inline]
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_CONTEXT.to_string();
    }

    results
        .iter()
        .map(format_result)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_result(result: &SearchResult) -> String {
    let metadata = &result.metadata;
    let optional_line = |key: &str, label: &str| {
        metadata_text(metadata, key)
            .map(|value| format!("{}: {}\n", label, value))
            .unwrap_or_default()
    };

    format!(
        "DOCUMENT: {}\nURL: {}\n{}{}RELEVANCE: {:.1}%\n{}\n{}",
        metadata_text(metadata, "title").unwrap_or_else(|| "Untitled".to_string()),
        metadata_text(metadata, "url").unwrap_or_else(|| "No URL".to_string()),
        optional_line("type", "TYPE"),
        optional_line("language", "LANGUAGE"),
        result.similarity * 100.0,
        result.document,
        DOCUMENT_DELIMITER
    )
}

/// Read a display field. Empty strings and nulls count as absent, other
/// scalar values are rendered as JSON.
fn metadata_text(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
