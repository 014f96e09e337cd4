//! Helpers for normalizing request values and artifact names.

const MAX_BASE_NAME_CHARS: usize = 50;
const FALLBACK_BASE_NAME: &str = "audio";

/// Derive a filesystem-safe artifact name from a source identifier.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, the result is capped at 50 characters, and
/// trailing underscores are trimmed. Distinct inputs may map to the same name.
pub fn sanitize_base_name(raw: &str) -> String {
    let capped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASE_NAME_CHARS)
        .collect();
    let trimmed = capped.trim_end_matches('_');
    if trimmed.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a comma-separated form value into trimmed, non-empty entries.
pub fn split_comma_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a client-supplied file name to its final path component.
pub fn sanitize_upload_name(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "upload.pdf".to_string()
    } else {
        name.to_string()
    }
}
