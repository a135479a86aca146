/// Identifies the language of recognized text.
///
/// Returns an ISO-639-3 code, or `None` when the text is empty, whitespace,
/// or too short/ambiguous for a reliable call. The caller must treat empty
/// OCR output as "no text" and skip detection entirely; this function
/// enforces the same guard so the invariant holds even when called directly.
pub fn detect_language(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let info = whatlang::detect(trimmed)?;
    info.is_reliable()
        .then(|| info.lang().code().to_string())
}
