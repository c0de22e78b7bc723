//! Post-model output cleanup and the boundary's sanity check.

use std::sync::LazyLock;

use regex::Regex;

static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));

/// Strip model artifacts from raw output.
///
/// Handles MedGemma thinking blocks (`<unusedN>thought\n...`), stray
/// `<unusedN>` tokens, and surrounding whitespace.
pub fn sanitize_model_output(raw: &str) -> String {
    let mut text = raw;

    if let Some(idx) = text.find("<unused") {
        if let Some(offset) = text[idx..].find("thought\n") {
            text = &text[idx + offset + "thought\n".len()..];
        }
    }

    UNUSED_TOKEN_RE.replace_all(text, "").trim().to_string()
}

/// Sanitize `raw` and check it is usable in place of `source`.
///
/// Output must be non-empty, printable apart from newlines and tabs, and at
/// most four times the source length plus 200 characters.
pub fn check_output(source: &str, raw: &str) -> Result<String, &'static str> {
    let text = sanitize_model_output(raw);

    if text.is_empty() {
        return Err("empty output");
    }
    if text.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return Err("control characters in output");
    }
    if text.chars().count() > source.chars().count() * 4 + 200 {
        return Err("output too long");
    }

    Ok(text)
}
