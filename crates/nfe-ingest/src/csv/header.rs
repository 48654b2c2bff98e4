//! Header normalization.

/// Normalizes a header value: strips a byte-order mark and surrounding whitespace.
pub fn normalize_header(value: &str) -> String {
    value.trim_matches('\u{feff}').trim().to_string()
}
