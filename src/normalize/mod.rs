//! Output normalizer: loosely-formatted model text → strict `Subject:`/`Body:` pair.
//!
//! The generative service is told to answer in a fixed two-section format but
//! does not always comply. Everything downstream of the remote call relies on
//! [`normalize`] to restore that contract, so it is total: any input produces
//! a [`NormalizedOutput`].

use std::fmt;

const SUBJECT_LABEL: &str = "subject:";
const BODY_LABEL: &str = "body:";
const COMMENTARY_MARKER: &str = "**changes";
const MAX_SYNTHESIZED_SUBJECT_CHARS: usize = 100;

/// Strict two-field rewrite result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedOutput {
    pub subject: String,
    pub body: String,
}

impl NormalizedOutput {
    /// Wire form handed back to the UI context.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NormalizedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject: {}\n\nBody: {}", self.subject, self.body)
    }
}

/// Normalize raw generated text into a subject/body pair.
pub fn normalize(raw: &str) -> NormalizedOutput {
    let text = raw.replace('\r', "");
    let text = text.trim();

    let (subject, body) = match find_label(text, SUBJECT_LABEL) {
        Some(label_start) => {
            let after_label = &text[label_start + SUBJECT_LABEL.len()..];
            let (subject_line, rest) = after_label.split_once('\n').unwrap_or((after_label, ""));
            (subject_line, extract_body(rest).unwrap_or(rest))
        }
        None => ("", extract_body(text).unwrap_or(text)),
    };

    let body = strip_commentary(body.trim_start());
    let body = tidy_body(&body);
    let mut subject = collapse_whitespace(subject);

    if subject.is_empty() {
        subject = body
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .chars()
            .take(MAX_SYNTHESIZED_SUBJECT_CHARS)
            .collect::<String>();
        // Truncation can leave a dangling space at the cut.
        subject = collapse_whitespace(&subject);
    }

    NormalizedOutput { subject, body }
}

/// Byte offset of the first case-insensitive occurrence of `label`.
///
/// ASCII lowercasing keeps byte offsets aligned with the original text.
fn find_label(haystack: &str, label: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(label)
}

fn extract_body(text: &str) -> Option<&str> {
    find_label(text, BODY_LABEL).map(|start| &text[start + BODY_LABEL.len()..])
}

/// Drop `**Changes...` trailers and standalone markdown heading lines.
fn strip_commentary(body: &str) -> String {
    let mut kept = Vec::new();
    for line in body.lines() {
        if line.to_ascii_lowercase().starts_with(COMMENTARY_MARKER) {
            break;
        }
        if is_heading(line) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}

fn is_heading(line: &str) -> bool {
    let rest = line.trim_start_matches('#');
    rest.len() < line.len() && rest.chars().next().is_none_or(char::is_whitespace)
}

/// Trim trailing whitespace per line; keep blank lines and list markers.
fn tidy_body(body: &str) -> String {
    body.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
