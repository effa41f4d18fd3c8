//! Shared guardrails for query payload bounds.

/// Longest query (in characters) forwarded to a search backend.
pub const MAX_QUERY_LENGTH: usize = 512;

/// Dependency names shown per direction in rendered context.
pub const MAX_DEPENDENCY_PREVIEW: usize = 5;

/// Trim whitespace and cut to at most `MAX_QUERY_LENGTH` characters.
pub fn truncate_query(query: &str) -> String {
    let stripped = query.trim();
    match stripped.char_indices().nth(MAX_QUERY_LENGTH) {
        Some((cut, _)) => stripped[..cut].to_string(),
        None => stripped.to_string(),
    }
}
