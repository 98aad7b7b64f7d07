use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Google API keys start with this prefix.
const PREFIX_PATTERNS: [&str; 2] = ["AIza", "ya29."];

/// Markers after which a credential value follows. `key=` covers the query
/// parameter the credential travels in, which transport errors echo back.
const MARKER_PATTERNS: [&str; 5] = [
    "key=",
    "access_token=",
    "\"key\":\"",
    "\"api_key\":\"",
    "x-goog-api-key: ",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Replace the token following each `marker`; `keep_marker` leaves the
/// marker text in place so the redacted field stays recognizable.
fn scrub_after_marker(scrubbed: &mut String, marker: &str, keep_marker: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Skip bare markers without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        let replace_from = if keep_marker { content_start } else { start };
        scrubbed.replace_range(replace_from..end, REDACTED);
        search_from = replace_from + REDACTED.len();
    }
}

fn needs_scrubbing(input: &str) -> bool {
    PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern))
}

/// Scrub credential-like tokens from service diagnostics.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    if !needs_scrubbing(input) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();

    for marker in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, marker, true);
    }

    for pattern in PREFIX_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern, false);
    }

    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_query_parameter_credentials() {
        let raw = "error sending request for url (https://example.test/v1beta/models?key=abcDEF123_-xyz)";
        let scrubbed = scrub_secret_patterns(raw);
        assert!(!scrubbed.contains("abcDEF123_-xyz"));
        assert!(scrubbed.contains("key=[REDACTED])"));
    }

    #[test]
    fn scrubs_bare_google_keys() {
        let raw = "API key not valid: AIzaSyA1234567890abcdefghijklmnopqrstu";
        let scrubbed = scrub_secret_patterns(raw);
        assert_eq!(scrubbed, "API key not valid: [REDACTED]");
    }

    #[test]
    fn leaves_clean_text_borrowed() {
        let raw = "The model is overloaded.";
        assert!(matches!(scrub_secret_patterns(raw), Cow::Borrowed(_)));
    }

    #[test]
    fn skips_markers_without_values() {
        let raw = "missing key= in request";
        assert_eq!(scrub_secret_patterns(raw), raw);
    }

    #[test]
    fn sanitize_truncates_long_errors_on_char_boundary() {
        let raw = "é".repeat(300);
        let sanitized = sanitize_api_error(&raw);
        assert!(sanitized.ends_with("..."));
        assert_eq!(sanitized.chars().count(), MAX_API_ERROR_CHARS / 2 + 3);
    }
}
